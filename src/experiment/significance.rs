//! Two-proportion significance test for click-through rates.

/// Critical z-values and the confidence tier each grants. Tier boundaries
/// are inclusive: a z-statistic exactly at a critical value earns the tier.
const CONFIDENCE_TIERS: [(f64, f64); 3] = [(1.96, 0.95), (1.645, 0.90), (1.28, 0.80)];

/// Below the lowest tier, confidence scales linearly with z and never
/// reaches the 0.80 tier.
const SUB_TIER_CAP: f64 = 0.79;

/// Confidence that the click-through rates of two variants truly differ.
///
/// Computes the pooled proportion under the null hypothesis of equal rates,
/// the standard error of the difference, and the absolute z-statistic, then
/// maps z to a discrete confidence tier. Returns exactly 0 when either
/// variant has zero impressions (undefined proportion) or when the pooled
/// rate leaves no variance (all clicks or none).
#[allow(clippy::cast_precision_loss)]
pub fn significance(
    clicks_a: u64,
    impressions_a: u64,
    clicks_b: u64,
    impressions_b: u64,
) -> f64 {
    if impressions_a == 0 || impressions_b == 0 {
        return 0.0;
    }

    let n_a = impressions_a as f64;
    let n_b = impressions_b as f64;
    let p_a = clicks_a as f64 / n_a;
    let p_b = clicks_b as f64 / n_b;

    let pooled = (clicks_a + clicks_b) as f64 / (n_a + n_b);
    let variance = pooled * (1.0 - pooled) * (1.0 / n_a + 1.0 / n_b);
    if variance <= 0.0 {
        return 0.0;
    }

    let z = ((p_b - p_a) / variance.sqrt()).abs();
    confidence_for(z)
}

fn confidence_for(z: f64) -> f64 {
    for (critical, confidence) in CONFIDENCE_TIERS {
        if z >= critical {
            return confidence;
        }
    }
    (z / 1.28 * SUB_TIER_CAP).min(SUB_TIER_CAP)
}
