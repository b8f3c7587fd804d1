use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serial_session::service::{AddPortOptions, SerialSession};
use serial_session::Encoding;
use std::time::Duration;

pub fn bench_hexlify(c: &mut Criterion) {
    let bytes: Vec<u8> = (0..=255).collect();
    let text = Encoding::Hexlify.decode(&bytes);

    c.bench_function("hexlify_decode_256", |b| {
        b.iter(|| black_box(Encoding::Hexlify.decode(black_box(&bytes))))
    });
    c.bench_function("hexlify_encode_256", |b| {
        b.iter(|| black_box(Encoding::Hexlify.encode(black_box(&text)).unwrap()))
    });
}

pub fn bench_read_until(c: &mut Criterion) {
    let mut session = SerialSession::new();
    session
        .add_port("loop://", AddPortOptions::new().with("timeout", 0.1))
        .unwrap();
    let line = "41 54 2B 47 4D 52 0D 0A";

    c.bench_function("loopback_write_read_until", |b| {
        b.iter(|| {
            session.write_data(line, None, None).unwrap();
            black_box(session.read_until(Some("0D 0A"), None, None, None).unwrap())
        })
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_millis(300))
        .measurement_time(Duration::from_secs(2));
    targets = bench_hexlify, bench_read_until
}
criterion_main!(benches);
