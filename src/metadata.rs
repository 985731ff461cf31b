//! Deterministic model metadata synthesis.
//!
//! The local protocol expects every model to report a size, a parameter count
//! and a quantization level. The upstream protocol reports none of those, so
//! they are synthesized: well-known identifiers get fixed values, everything
//! else is bucketed by a rolling hash so the same identifier always reports
//! the same shape.

/// Synthesized (size, parameter count, quantization) triple for a model id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelMetadata {
    /// Claimed size in bytes.
    pub size: u64,
    /// Parameter-count label, e.g. `"20B"`.
    pub parameter_size: &'static str,
    /// Quantization label; always `"Q4_K_M"`.
    pub quantization_level: &'static str,
}

const QUANTIZATION: &str = "Q4_K_M";

/// Fixed values for identifiers clients commonly probe for.
const KNOWN_MODELS: &[(&str, u64, &str)] = &[
    ("gpt-4", 8_500_000_000, "175B"),
    ("gpt-4-turbo", 7_200_000_000, "175B"),
    ("gpt-3.5-turbo", 4_200_000_000, "20B"),
    ("gpt-4o", 6_800_000_000, "175B"),
    ("gpt-4o-mini", 2_100_000_000, "8B"),
    ("claude", 5_500_000_000, "70B"),
    ("gemini", 4_800_000_000, "30B"),
];

/// Hash buckets for unknown identifiers, smallest model first.
const SIZE_BUCKETS: &[(u64, &str)] = &[
    (2_100_000_000, "8B"),
    (4_200_000_000, "20B"),
    (6_800_000_000, "70B"),
    (8_500_000_000, "175B"),
];

/// Map a model identifier to a plausible metadata triple.
///
/// Pure and deterministic: the same id always yields the same triple.
pub fn synthesize(model_id: &str) -> ModelMetadata {
    if let Some((_, size, param)) = KNOWN_MODELS.iter().find(|(id, _, _)| *id == model_id) {
        return ModelMetadata {
            size: *size,
            parameter_size: param,
            quantization_level: QUANTIZATION,
        };
    }

    // 32-bit signed rolling hash (h * 31 + code unit), left to right over
    // UTF-16 code units, so non-BMP characters hash as surrogate pairs.
    let hash = model_id
        .encode_utf16()
        .fold(0i32, |h, u| h.wrapping_mul(31).wrapping_add(i32::from(u)));
    let idx = (hash.unsigned_abs() as usize) % SIZE_BUCKETS.len();
    let (size, param) = SIZE_BUCKETS[idx];

    ModelMetadata {
        size,
        parameter_size: param,
        quantization_level: QUANTIZATION,
    }
}
