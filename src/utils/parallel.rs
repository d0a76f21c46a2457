/// Parallel processing utilities

/// Installs the global rayon pool. `0` means one thread per CPU.
pub fn configure_thread_pool(threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(effective_threads(threads))
        .build_global()
}

pub fn effective_threads(threads: usize) -> usize {
    if threads == 0 {
        num_cpus::get()
    } else {
        threads
    }
}

/// Reads per rayon task within one batch.
pub fn chunk_size_for_parallelism(total_items: usize, threads: usize) -> usize {
    let threads = if threads == 0 {
        rayon::current_num_threads()
    } else {
        threads
    };

    // At least 10 items per thread, never more than 1000 per chunk
    let ideal_chunk = total_items / (threads * 10);
    ideal_chunk.clamp(10, 1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_threads() {
        assert_eq!(effective_threads(3), 3);
        assert!(effective_threads(0) >= 1);
    }

    #[test]
    fn test_chunk_size_bounds() {
        assert_eq!(chunk_size_for_parallelism(5, 4), 10);
        assert_eq!(chunk_size_for_parallelism(10_000, 4), 250);
        assert_eq!(chunk_size_for_parallelism(10_000_000, 1), 1000);
    }
}
