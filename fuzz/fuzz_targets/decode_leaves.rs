#![no_main]
use libfuzzer_sys::fuzz_target;
use tidepack::{BitSeq, Codec, Lsb0, Msb0, Uint, VarBytes, VarSeq};

fuzz_target!(|data: &[u8]| {
    let _ = Uint::decode(data);
    let _ = u64::decode(data);
    let _ = i32::decode(data);
    let _ = String::decode(data);
    let _ = VarBytes::decode(data);
    let _ = BitSeq::<Lsb0>::decode(data);
    let _ = BitSeq::<Msb0>::decode(data);
    let _ = VarSeq::<u16>::decode(data);
});
