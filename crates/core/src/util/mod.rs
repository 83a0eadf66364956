pub mod hash;

/// A macro to measure the evaluation time of an expression. Wraps an
/// expression, logs how long it took to evaluate, and returns the value of the
/// expression.
#[macro_export]
macro_rules! timed {
    ($label:expr, $ex:expr) => {
        timed!($label, log::Level::Debug, $ex)
    };
    ($label:expr, $log_level:expr, $ex:expr) => {{
        let now = std::time::Instant::now();
        let value = $ex;
        let elapsed = now.elapsed();
        log::log!($log_level, "{} took {} ms", $label, elapsed.as_millis());
        value
    }};
}

/// Find the most frequent value in a slice. Ties are broken in favor of the
/// value that appears first. Returns `None` only for an empty slice.
pub fn majority<T: Copy + PartialEq>(values: &[T]) -> Option<T> {
    let mut best: Option<(T, usize)> = None;
    for (i, value) in values.iter().enumerate() {
        // Only count each distinct value once, at its first appearance
        if values[..i].contains(value) {
            continue;
        }
        let count = values.iter().filter(|v| *v == value).count();
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((*value, count)),
        }
    }
    best.map(|(value, _)| value)
}

/// Collect the distinct values of a slice, in order of first appearance.
pub fn distinct<T: Copy + PartialEq>(values: &[T]) -> Vec<T> {
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        if !out.contains(value) {
            out.push(*value);
        }
    }
    out
}
