use criterion::{black_box, criterion_group, criterion_main, Criterion};
use obfid_rs::{Codec, Config};

fn codec_benchmark(c: &mut Criterion) {
    let codec = Codec::new(&Config::new(35).unwrap().seed(b"bench"));
    let code = codec.obfuscate(123_456_789).unwrap();

    c.bench_function("obfuscate", |b| {
        b.iter(|| codec.obfuscate(black_box(123_456_789)))
    });
    c.bench_function("deobfuscate", |b| {
        b.iter(|| codec.deobfuscate(black_box(&code)))
    });
}

criterion_group!(benches, codec_benchmark);
criterion_main!(benches);
