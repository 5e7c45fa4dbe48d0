use rand::Rng;

/// Largest top-left coordinate that keeps `size` pixels inside `screen` with
/// `margin` on both sides. Clamps to `margin` when the screen is too small.
pub fn max_origin(screen: i32, size: i32, margin: i32) -> i32 {
    (screen - size - margin).max(margin)
}

/// Random top-left position for a surface of `size` on a `screen`.
pub fn random_position<R: Rng + ?Sized>(
    rng: &mut R,
    screen: (i32, i32),
    size: (i32, i32),
    margin: i32,
) -> (i32, i32) {
    let x = rng.gen_range(margin..=max_origin(screen.0, size.0, margin));
    let y = rng.gen_range(margin..=max_origin(screen.1, size.1, margin));
    (x, y)
}
