//! GF(2^8) arithmetic for byte-wise Shamir sharing
//!
//! Field polynomial x^8 + x^4 + x^3 + x + 1 (0x11B, the AES field) with
//! generator 3. The log/exp tables are built at compile time.

const REDUCTION: u8 = 0x1B;
const GENERATOR: u8 = 0x03;

struct Tables {
    log: [u8; 256],
    /// exp[i] = g^i, doubled so log sums index without a modulo
    exp: [u8; 510],
}

/// Multiply by x, reducing modulo the field polynomial.
const fn xtime(a: u8) -> u8 {
    let shifted = a << 1;
    if a & 0x80 != 0 {
        shifted ^ REDUCTION
    } else {
        shifted
    }
}

const fn build_tables() -> Tables {
    let mut log = [0u8; 256];
    let mut exp = [0u8; 510];
    let mut x: u8 = 1;
    let mut i = 0;
    while i < 255 {
        exp[i] = x;
        exp[i + 255] = x;
        log[x as usize] = i as u8;
        // x * 3 = x * 2 + x
        x = xtime(x) ^ x;
        i += 1;
    }
    Tables { log, exp }
}

static TABLES: Tables = build_tables();

#[inline]
pub fn add(a: u8, b: u8) -> u8 {
    a ^ b
}

#[inline]
pub fn mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let sum = TABLES.log[a as usize] as usize + TABLES.log[b as usize] as usize;
    TABLES.exp[sum]
}

/// Multiplicative inverse. `a` must be non-zero.
#[inline]
pub fn inv(a: u8) -> u8 {
    debug_assert!(a != 0, "zero has no inverse in GF(256)");
    TABLES.exp[255 - TABLES.log[a as usize] as usize]
}

/// `a / b`. `b` must be non-zero.
#[inline]
pub fn div(a: u8, b: u8) -> u8 {
    mul(a, inv(b))
}

/// Horner evaluation; `coefficients[0]` is the constant term.
pub fn eval_poly(coefficients: &[u8], x: u8) -> u8 {
    coefficients
        .iter()
        .rev()
        .fold(0u8, |acc, &c| add(mul(acc, x), c))
}

/// Value at `x` of the polynomial through the points `(xs[i], ys[i])`.
///
/// The x-coordinates must be distinct; callers check this.
pub fn interpolate(xs: &[u8], ys: &[u8], x: u8) -> u8 {
    debug_assert_eq!(xs.len(), ys.len());
    let mut value = 0u8;
    for (i, (&xi, &yi)) in xs.iter().zip(ys).enumerate() {
        let mut basis = 1u8;
        for (j, &xj) in xs.iter().enumerate() {
            if i != j {
                // subtraction is XOR in characteristic 2
                basis = mul(basis, div(add(x, xj), add(xi, xj)));
            }
        }
        value = add(value, mul(yi, basis));
    }
    value
}
