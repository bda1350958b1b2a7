#![no_main]
use libfuzzer_sys::fuzz_target;
use tidepack::{choice, record, Codec, Dict, VarBytes};

record! {
    struct Header {
        version: u8,
        tags: Dict<String, u64>,
        body: VarBytes,
    }
}

choice! {
    enum Frame {
        Empty(()),
        Header(Header),
        Raw(Vec<u8>),
    }
}

fuzz_target!(|data: &[u8]| {
    let _ = Option::<u32>::decode(data);
    let _ = Dict::<String, u64>::decode(data);
    let _ = Header::decode(data);
    if let Ok(frame) = Frame::decode(data) {
        // Anything that decodes must survive the round trip.
        let enc = frame.encode();
        assert_eq!(Frame::decode(&enc).unwrap(), frame);
    }
});
