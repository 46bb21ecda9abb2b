//! Framing layer benchmarks.
//!
//! Measures record seal/open throughput at the maximum payload size and the
//! per-session key derivation cost, per supported cipher.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use snell::crypto::{Cipher, CipherKind, RecordNonce};
use snell::MAX_PAYLOAD_SIZE;

const KINDS: [CipherKind; 3] = [
    CipherKind::Aes128Gcm,
    CipherKind::Aes256Gcm,
    CipherKind::ChaCha20Poly1305,
];

fn bench_seal(c: &mut Criterion) {
    let mut group = c.benchmark_group("seal_max_payload");
    group.throughput(Throughput::Bytes(MAX_PAYLOAD_SIZE as u64));

    for kind in KINDS {
        let cipher = Cipher::new(kind, b"benchmark secret");
        let aead = cipher.encrypter(&vec![0u8; cipher.salt_size()]).unwrap();
        let nonce = RecordNonce::new();
        let payload = vec![0xaau8; MAX_PAYLOAD_SIZE];

        group.bench_function(kind.name(), |b| {
            b.iter(|| black_box(aead.seal(&nonce, black_box(&payload)).unwrap()))
        });
    }

    group.finish();
}

fn bench_open(c: &mut Criterion) {
    let mut group = c.benchmark_group("open_max_payload");
    group.throughput(Throughput::Bytes(MAX_PAYLOAD_SIZE as u64));

    for kind in KINDS {
        let cipher = Cipher::new(kind, b"benchmark secret");
        let salt = vec![0u8; cipher.salt_size()];
        let sealer = cipher.encrypter(&salt).unwrap();
        let opener = cipher.decrypter(&salt).unwrap();
        let nonce = RecordNonce::new();
        let sealed = sealer.seal(&nonce, &vec![0xaau8; MAX_PAYLOAD_SIZE]).unwrap();

        group.bench_function(kind.name(), |b| {
            b.iter(|| black_box(opener.open(&nonce, black_box(&sealed)).unwrap()))
        });
    }

    group.finish();
}

fn bench_session_key_derivation(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_key_derivation");

    for kind in KINDS {
        let cipher = Cipher::new(kind, b"benchmark secret");
        let salt = vec![0x42u8; cipher.salt_size()];

        group.bench_function(kind.name(), |b| {
            b.iter(|| black_box(cipher.encrypter(black_box(&salt)).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_seal, bench_open, bench_session_key_derivation);
criterion_main!(benches);
