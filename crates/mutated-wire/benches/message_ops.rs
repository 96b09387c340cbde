use mutated_wire::{MemcHeader, SynRequest, CMD_SET, REQUEST_SIZE};

fn main() {
    divan::main();
}

#[divan::bench]
fn synthetic_round_trip() {
    let req = SynRequest::single_delay(divan::black_box(7), divan::black_box(250));
    let mut buf = [0u8; REQUEST_SIZE];
    req.encode(&mut buf);
    divan::black_box(SynRequest::decode(&buf).unwrap());
}

#[divan::bench]
fn memcache_header_round_trip() {
    let h = MemcHeader::request(CMD_SET, 30, 8, 30 + 8 + 100, divan::black_box(1));
    let mut buf = [0u8; mutated_wire::HEADER_SIZE];
    h.encode(&mut buf);
    divan::black_box(MemcHeader::decode(&buf).unwrap());
}
