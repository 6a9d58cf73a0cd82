// Integration tests for the credit-controlled worker stream.
// Tests cover: ordering, liveness, rendezvous semantics, the channel
// occupancy bound, early consumer departure, and the full
// serialize-encrypt-stream-decrypt-deserialize job.

mod common;

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use common::{AesDecrypt, AesEncrypt, XorCipher};
use flowrs::{
    ChunkReader, ChunkSink, CreditStream, DataWriter, DecryptingStream, EncryptingSink, FlowError,
    Generator, IterGenerator, Producer, StreamConfig,
};

const KEY: [u8; 16] = [
    0x2B, 0x7E, 0x15, 0x16, 0x28, 0xAE, 0xD2, 0xA6, 0xAB, 0xF7, 0x15, 0x88, 0x09, 0xCF, 0x4F,
    0x3C,
];

// ============================================================================
// Ordering and Liveness
// ============================================================================

#[tokio::test]
async fn test_values_arrive_in_order() {
    let stream = CreditStream::spawn(IterGenerator::new(0..10_000u32).with_budget(8));
    let values: Vec<u32> = stream.map(|r| r.unwrap()).collect().await;
    assert_eq!(values, (0..10_000).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_every_budget_completes() {
    // Liveness across the three budget regimes, including rendezvous
    for budget in [-1i64, 0, 1, 2, 7, 1024] {
        let config = StreamConfig::default().with_buffer_budget(budget);
        let stream = CreditStream::spawn_with(IterGenerator::new(0..200u32), config);
        let values: Vec<u32> = stream.map(|r| r.unwrap()).collect().await;
        assert_eq!(values.len(), 200, "budget {}", budget);
    }
}

// ============================================================================
// Rendezvous Semantics
// ============================================================================

struct RendezvousGenerator {
    count: u64,
    observed: Arc<AtomicU64>,
    violations: Arc<AtomicU64>,
}

impl Generator for RendezvousGenerator {
    type Item = u64;

    fn buffer_budget(&self) -> i64 {
        0
    }

    fn size_of(_item: &u64) -> usize {
        1
    }

    fn generate(
        self,
        producer: &mut Producer<u64>,
    ) -> impl Future<Output = Result<(), FlowError>> + Send {
        async move {
            for i in 0..self.count {
                producer.send(i).await?;
                // With a zero budget, send returns only after the consumer
                // has observed the value
                if self.observed.load(Ordering::SeqCst) < i + 1 {
                    self.violations.fetch_add(1, Ordering::SeqCst);
                }
            }
            Ok(())
        }
    }
}

#[tokio::test]
async fn test_rendezvous_waits_for_consumer() {
    let observed = Arc::new(AtomicU64::new(0));
    let violations = Arc::new(AtomicU64::new(0));

    let mut stream = CreditStream::spawn(RendezvousGenerator {
        count: 50,
        observed: observed.clone(),
        violations: violations.clone(),
    });

    let mut next_expected = 0u64;
    while let Some(value) = stream.next().await {
        assert_eq!(value.unwrap(), next_expected);
        next_expected += 1;
        observed.fetch_add(1, Ordering::SeqCst);
    }

    assert_eq!(next_expected, 50);
    assert_eq!(
        violations.load(Ordering::SeqCst),
        0,
        "every send must have returned after its receive"
    );
}

// ============================================================================
// Early Consumer Departure
// ============================================================================

struct EndlessGenerator {
    wound_down: Arc<AtomicBool>,
}

impl Generator for EndlessGenerator {
    type Item = Bytes;

    fn buffer_budget(&self) -> i64 {
        16
    }

    fn size_of(chunk: &Bytes) -> usize {
        chunk.len()
    }

    fn generate(
        self,
        producer: &mut Producer<Bytes>,
    ) -> impl Future<Output = Result<(), FlowError>> + Send {
        async move {
            loop {
                match producer.send(Bytes::from_static(&[0xEE; 8])).await {
                    Ok(()) => {}
                    Err(FlowError::ConsumerGone) => {
                        self.wound_down.store(true, Ordering::SeqCst);
                        return Ok(());
                    }
                    Err(e) => return Err(e),
                }
            }
        }
    }
}

#[tokio::test]
async fn test_dropped_consumer_winds_worker_down() {
    let wound_down = Arc::new(AtomicBool::new(false));
    let mut stream = CreditStream::spawn(EndlessGenerator {
        wound_down: wound_down.clone(),
    });

    // Take a few values, then walk away
    for _ in 0..3 {
        stream.next().await.unwrap().unwrap();
    }
    drop(stream);

    // The producer must notice the closed channels instead of hanging
    for _ in 0..200 {
        if wound_down.load(Ordering::SeqCst) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(
        wound_down.load(Ordering::SeqCst),
        "producer should detect channel closure and return cleanly"
    );
}

// ============================================================================
// Big Streamed Job
// ============================================================================

const RECORDS: u64 = 25_000;
const JOB_SEED: u64 = 0x5EED;
const JOB_BUDGET: i64 = 64 * 1024;

fn record_payload_len(i: u64, rng: &mut StdRng) -> u32 {
    if i % 2 == 0 {
        rng.gen_range(0..34)
    } else {
        rng.gen_range(0..600)
    }
}

struct CipherJobGenerator {
    high_water: Arc<AtomicU64>,
}

impl Generator for CipherJobGenerator {
    type Item = Bytes;

    fn buffer_budget(&self) -> i64 {
        JOB_BUDGET
    }

    fn size_of(chunk: &Bytes) -> usize {
        chunk.len()
    }

    fn generate(
        self,
        producer: &mut Producer<Bytes>,
    ) -> impl Future<Output = Result<(), FlowError>> + Send {
        async move {
            let sink = ChunkSink::new(producer);
            let encrypting = EncryptingSink::new(AesEncrypt::new(&KEY), sink);
            let mut writer = DataWriter::new(encrypting);

            let mut rng = StdRng::seed_from_u64(JOB_SEED);
            for i in 0..RECORDS {
                writer.write_i64(i as i64)?;
                let n = record_payload_len(i, &mut rng);
                writer.write_u32(n)?;
                writer.write_bytes(vec![0u8; n as usize])?;
                writer.flush_if_needed().await?;
            }
            writer.close()?;

            let high_water = writer.sink().sink().producer().high_water();
            self.high_water.store(high_water, Ordering::SeqCst);
            Ok(())
        }
    }
}

#[tokio::test]
async fn test_big_streamed_cipher_job() {
    let high_water = Arc::new(AtomicU64::new(0));
    let stream = CreditStream::spawn(CipherJobGenerator {
        high_water: high_water.clone(),
    });

    let decrypting = DecryptingStream::new(AesDecrypt::new(&KEY), stream);
    let mut reader = ChunkReader::new(decrypting);

    let mut rng = StdRng::seed_from_u64(JOB_SEED);
    for i in 0..RECORDS {
        assert_eq!(reader.read_i64().await.unwrap(), i as i64, "record {}", i);
        let n = reader.read_u32().await.unwrap();
        assert_eq!(n, record_payload_len(i, &mut rng), "record {} length", i);
        let payload = reader.read_bytes(n as usize).await.unwrap();
        assert_eq!(payload.len(), n as usize);
        assert!(payload.iter().all(|&b| b == 0), "record {} payload", i);
    }
    assert!(reader.is_eof().await.unwrap());

    // Channel occupancy bound: the pending amount never exceeded twice the
    // ack unit over the whole run
    let ack_unit = JOB_BUDGET as u64;
    assert!(
        high_water.load(Ordering::SeqCst) <= 2 * ack_unit,
        "channel occupancy exceeded the credit bound"
    );
}

// ============================================================================
// Small Pipeline Under Tight Budgets
// ============================================================================

struct TextJobGenerator;

impl Generator for TextJobGenerator {
    type Item = Bytes;

    fn buffer_budget(&self) -> i64 {
        1
    }

    fn size_of(chunk: &Bytes) -> usize {
        chunk.len()
    }

    fn generate(
        self,
        producer: &mut Producer<Bytes>,
    ) -> impl Future<Output = Result<(), FlowError>> + Send {
        async move {
            let sink = ChunkSink::new(producer);
            let encrypting = EncryptingSink::new(XorCipher::new(&[0x3C; 8]), sink);
            let mut writer = DataWriter::new(encrypting);
            for i in 0..100u32 {
                writer.write_utf8(&format!("line {}", i))?;
                writer.flush_if_needed().await?;
            }
            writer.close()?;
            Ok(())
        }
    }
}

#[tokio::test]
async fn test_tight_budget_pipeline() {
    let stream = CreditStream::spawn(TextJobGenerator);
    let decrypting = DecryptingStream::new(XorCipher::new(&[0x3C; 8]), stream);
    let mut reader = ChunkReader::new(decrypting);

    for i in 0..100u32 {
        assert_eq!(reader.read_utf8().await.unwrap(), format!("line {}", i));
    }
    assert!(reader.is_eof().await.unwrap());
}
