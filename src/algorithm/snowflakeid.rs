use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

// 2024-01-01T00:00:00Z
pub const DEFAULT_EPOCH_MS: u64 = 1_704_067_200_000;

const MACHINE_BITS: u64 = 10;
const SEQUENCE_BITS: u64 = 12;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;
const TIMESTAMP_MASK: u64 = (1 << 41) - 1;

/// Row id generator: 41 bits of milliseconds since `epoch`, 12 bits of
/// per-millisecond sequence and 10 bits of machine id.
pub struct SnowflakeId {
    epoch: u64,
    machine_id: u16,
    state: AtomicU64,
}

impl SnowflakeId {
    pub fn new(machine_id: u16, epoch: u64) -> Result<Self, String> {
        if machine_id as u64 >= 1 << MACHINE_BITS {
            return Err(format!(
                "Invalid machine id {}, expected 0..{}",
                machine_id,
                (1 << MACHINE_BITS) - 1
            ));
        }

        Ok(Self {
            epoch,
            machine_id,
            state: AtomicU64::new(0),
        })
    }

    pub fn machine_id(&self) -> u16 {
        self.machine_id
    }

    pub fn generate(&self) -> i64 {
        loop {
            let now_ms = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64;

            let current_ts = now_ms.saturating_sub(self.epoch);
            let old_state = self.state.load(Ordering::Acquire);
            let old_ts = old_state >> SEQUENCE_BITS;
            let old_seq = old_state & SEQUENCE_MASK;

            // clock going backwards keeps the last timestamp and burns sequence
            let (new_ts, new_seq) = if current_ts > old_ts {
                (current_ts, 0)
            } else {
                let next_seq = (old_seq + 1) & SEQUENCE_MASK;
                if next_seq == 0 {
                    std::hint::spin_loop();
                    continue;
                }
                (old_ts, next_seq)
            };

            let new_state = (new_ts << SEQUENCE_BITS) | new_seq;

            if self
                .state
                .compare_exchange_weak(old_state, new_state, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                let id = ((new_ts & TIMESTAMP_MASK) << (SEQUENCE_BITS + MACHINE_BITS))
                    | (new_seq << MACHINE_BITS)
                    | (self.machine_id as u64);

                return id as i64;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};
    use std::thread;

    fn new_generator() -> SnowflakeId {
        SnowflakeId::new(42, DEFAULT_EPOCH_MS).unwrap()
    }

    #[test]
    fn test_generate_positive_ids() {
        let generator = new_generator();
        assert!(generator.generate() > 0);
    }

    #[test]
    fn test_machine_id_is_embedded() {
        let generator = new_generator();
        let id = generator.generate() as u64;

        assert_eq!(id & 0x3FF, 42);
        assert_eq!(generator.machine_id(), 42);
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let generator = new_generator();
        let ids = (0..10_000).map(|_| generator.generate()).collect::<Vec<_>>();

        let unique = ids.iter().cloned().collect::<HashSet<_>>();
        assert_eq!(unique.len(), ids.len());
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_no_duplicate_across_threads() {
        let generator = Arc::new(new_generator());
        let all = Arc::new(Mutex::new(HashSet::new()));
        let threads = 8;
        let per_thread = 20_000;

        let handles = (0..threads)
            .map(|_| {
                let generator = generator.clone();
                let all = all.clone();

                thread::spawn(move || {
                    let local = (0..per_thread)
                        .map(|_| generator.generate())
                        .collect::<Vec<_>>();
                    all.lock().unwrap().extend(local);
                })
            })
            .collect::<Vec<_>>();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(all.lock().unwrap().len(), threads * per_thread);
    }

    #[test]
    fn test_invalid_machine_id() {
        assert!(SnowflakeId::new(1 << 10, 0).is_err());
    }
}
