use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vstpreset::tag::{COMP, CONT, INFO};
use vstpreset::Preset;

fn large_preset() -> Preset {
    let mut preset = Preset::new("ABCDEF0123456789ABCDEF0123456789");
    preset.insert_chunk(COMP, vec![42u8; 1024 * 1024]);
    preset.insert_chunk(CONT, vec![7u8; 64 * 1024]);
    preset.insert_chunk(INFO, b"<MetaInfo/>".to_vec());
    preset
}

fn bench_encode(c: &mut Criterion) {
    let preset = large_preset();
    c.bench_function("encode_1mb", |b| b.iter(|| black_box(&preset).encode().unwrap()));
}

fn bench_decode(c: &mut Criterion) {
    let buf = large_preset().encode().unwrap();
    c.bench_function("decode_1mb", |b| b.iter(|| Preset::decode(black_box(&buf)).unwrap()));
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
