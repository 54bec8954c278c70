use std::ops::{Add, Div, Mul, Sub};

/// Element of GF(2^8) with the AES reduction polynomial x^8 + x^4 + x^3 + x + 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GF256(u8);

// Log/exp tables over generator 3, built once at compile time. The exp table
// is doubled so that exp[log a + log b] never needs a mod-255 step.
const TABLES: ([u8; 256], [u8; 512]) = build_tables();
const LOG: [u8; 256] = TABLES.0;
const EXP: [u8; 512] = TABLES.1;

const fn build_tables() -> ([u8; 256], [u8; 512]) {
    let mut log = [0u8; 256];
    let mut exp = [0u8; 512];
    let mut x: u8 = 1;
    let mut i = 0;
    while i < 255 {
        exp[i] = x;
        exp[i + 255] = x;
        log[x as usize] = i as u8;
        // x *= 3 in the field: x ^ xtime(x)
        let mut doubled = x << 1;
        if x & 0x80 != 0 {
            doubled ^= 0x1b;
        }
        x ^= doubled;
        i += 1;
    }
    (log, exp)
}

impl GF256 {
    pub fn new(value: u8) -> Self {
        GF256(value)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Add for GF256 {
    type Output = GF256;

    fn add(self, rhs: GF256) -> GF256 {
        GF256(self.0 ^ rhs.0)
    }
}

// Subtraction is identical to addition in a field of characteristic 2.
impl Sub for GF256 {
    type Output = GF256;

    fn sub(self, rhs: GF256) -> GF256 {
        GF256(self.0 ^ rhs.0)
    }
}

impl Mul for GF256 {
    type Output = GF256;

    fn mul(self, rhs: GF256) -> GF256 {
        if self.0 == 0 || rhs.0 == 0 {
            return GF256(0);
        }
        GF256(EXP[LOG[self.0 as usize] as usize + LOG[rhs.0 as usize] as usize])
    }
}

impl Div for GF256 {
    type Output = GF256;

    fn div(self, rhs: GF256) -> GF256 {
        // Share indices are non-zero and pairwise distinct, so a zero divisor
        // can only mean a broken invariant upstream.
        assert!(rhs.0 != 0, "division by zero in GF(256)");
        if self.0 == 0 {
            return GF256(0);
        }
        GF256(EXP[LOG[self.0 as usize] as usize + 255 - LOG[rhs.0 as usize] as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_xor() {
        assert_eq!((GF256::new(0x53) + GF256::new(0xca)).value(), 0x99);
        assert_eq!((GF256::new(0x53) - GF256::new(0xca)).value(), 0x99);
        assert_eq!((GF256::new(7) + GF256::new(7)).value(), 0);
    }

    #[test]
    fn test_known_product() {
        // 0x53 * 0xCA = 0x01 is the classic AES field example
        assert_eq!((GF256::new(0x53) * GF256::new(0xca)).value(), 0x01);
        assert_eq!((GF256::new(0) * GF256::new(0xca)).value(), 0);
        assert_eq!((GF256::new(1) * GF256::new(0xab)).value(), 0xab);
    }

    #[test]
    fn test_mul_div_roundtrip() {
        for a in 1..=255u8 {
            for b in 1..=255u8 {
                let product = GF256::new(a) * GF256::new(b);
                assert_eq!((product / GF256::new(b)).value(), a);
            }
        }
    }

    #[test]
    fn test_every_nonzero_element_has_inverse() {
        for a in 1..=255u8 {
            let inv = GF256::new(1) / GF256::new(a);
            assert_eq!((GF256::new(a) * inv).value(), 1);
        }
    }

    #[test]
    #[should_panic(expected = "division by zero")]
    fn test_div_by_zero_panics() {
        let _ = GF256::new(5) / GF256::new(0);
    }
}
