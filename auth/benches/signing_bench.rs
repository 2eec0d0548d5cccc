// Signing & verification benchmarks for the routstr gate.
//
// Covers key generation, ECDSA sign/verify over secp256k1, the raw-bytes
// gate path, BIP-340 signing, and batch verification at various sizes.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use routstr_auth::crypto::{batch_verify, digest, sign, sign_schnorr, verify, PrivateKey};
use routstr_auth::RequestGate;

fn bench_key_generation(c: &mut Criterion) {
    c.bench_function("secp256k1/key_generate", |b| {
        b.iter(PrivateKey::generate);
    });
}

fn bench_sign(c: &mut Criterion) {
    let key = PrivateKey::generate();
    let d = digest(b"POST /v1/chat/completions; nonce=42");

    c.bench_function("ecdsa/sign", |b| {
        b.iter(|| sign(&key, &d).unwrap());
    });
}

fn bench_verify(c: &mut Criterion) {
    let key = PrivateKey::generate();
    let d = digest(b"POST /v1/chat/completions; nonce=42");
    let sig = sign(&key, &d).unwrap();
    let public_key = key.public_key();

    c.bench_function("ecdsa/verify", |b| {
        b.iter(|| verify(&public_key, &d, &sig));
    });
}

fn bench_gate_check(c: &mut Criterion) {
    let key = PrivateKey::generate();
    let body = vec![0x42u8; 4096];
    let sig = sign(&key, &digest(&body)).unwrap().to_der();
    let pk = key.public_key().to_compressed();
    let gate = RequestGate::new();

    c.bench_function("gate/check_4k_body", |b| {
        b.iter(|| gate.check(&pk, &body, &sig).unwrap());
    });
}

fn bench_schnorr_sign(c: &mut Criterion) {
    let key = PrivateKey::generate();
    let d = digest(b"nostr event");

    c.bench_function("bip340/sign", |b| {
        b.iter(|| sign_schnorr(&key, &d).unwrap());
    });
}

fn bench_batch_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("ecdsa/batch_verify");

    for size in [10, 50, 100] {
        let items: Vec<_> = (0..size)
            .map(|i| {
                let key = PrivateKey::generate();
                let d = digest(format!("req-{:06}", i).as_bytes());
                let sig = sign(&key, &d).unwrap();
                (key.public_key(), d, sig)
            })
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &items, |b, items| {
            b.iter(|| assert!(batch_verify(items)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_key_generation,
    bench_sign,
    bench_verify,
    bench_gate_check,
    bench_schnorr_sign,
    bench_batch_verify,
);
criterion_main!(benches);
