/// `ln(10) / 20`: converts decibels to a natural-log exponent.
const DB_TO_EXP: f64 = 0.115_129_254_649_702_29;

/// Convert a gain in decibels to a linear amplitude factor (`10^(db/20)`).
pub fn decibel_to_linear(db: f64) -> f64 {
    (DB_TO_EXP * db).exp()
}

#[cfg(test)]
#[path = "../../tests/unit/audio/gain.rs"]
mod tests;
