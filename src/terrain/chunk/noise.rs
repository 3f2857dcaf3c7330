// ============================================
// Noise Functions - Value noise для рельефа
// ============================================

/// Хэш решётки с сидом, значение 0.0..1.0
#[inline(always)]
pub fn hash2d(seed: u32, x: i32, y: i32) -> f32 {
    let n = x
        .wrapping_mul(374761393)
        .wrapping_add(y.wrapping_mul(668265263))
        .wrapping_add((seed as i32).wrapping_mul(1013904223));
    let n = (n ^ (n >> 13)).wrapping_mul(1274126177);
    let n = n ^ (n >> 16);
    ((n as u32) as f32) / (u32::MAX as f32)
}

#[inline(always)]
fn fade(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// 2D value noise, 0.0..1.0
#[inline]
pub fn noise2d(seed: u32, x: f32, y: f32) -> f32 {
    let x0 = x.floor();
    let y0 = y.floor();
    let (xi, yi) = (x0 as i32, y0 as i32);
    let tx = fade(x - x0);
    let ty = fade(y - y0);

    let bottom = lerp(hash2d(seed, xi, yi), hash2d(seed, xi + 1, yi), tx);
    let top = lerp(hash2d(seed, xi, yi + 1), hash2d(seed, xi + 1, yi + 1), tx);
    lerp(bottom, top, ty)
}

#[inline(always)]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

/// FBM: октавы с половинной амплитудой, результат нормирован в 0.0..1.0
pub fn fbm2d(seed: u32, x: f32, y: f32, octaves: u32) -> f32 {
    let mut value = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut total = 0.0;

    for octave in 0..octaves.max(1) {
        value += amplitude * noise2d(seed.wrapping_add(octave), x * frequency, y * frequency);
        total += amplitude;
        amplitude *= 0.5;
        frequency *= 2.0;
    }

    value / total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_range_and_determinism() {
        for i in 0..200 {
            let x = i as f32 * 0.37 - 30.0;
            let y = i as f32 * -0.61 + 12.0;
            let v = fbm2d(7, x, y, 4);
            assert!((0.0..=1.0).contains(&v));
            assert_eq!(v, fbm2d(7, x, y, 4));
        }
    }

    #[test]
    fn test_noise_matches_lattice() {
        assert_eq!(noise2d(3, 5.0, -2.0), hash2d(3, 5, -2));
        assert_ne!(hash2d(1, 5, -2), hash2d(2, 5, -2));
    }
}
