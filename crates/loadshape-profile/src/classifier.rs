use loadshape_core::Stage;

/// Whether `stages` fit the engine's single ramp-up/hold block.
///
/// Accepted shapes: up to one stage; a delay or an initial hold followed by
/// one more stage; a delay followed by a ramp and a hold.
pub fn is_simple(stages: &[Stage]) -> bool {
    match stages {
        [] | [_] => true,
        [first, second] => first.target == 0 || first.target == second.target,
        [first, second, third] => first.target == 0 && second.target == third.target,
        _ => false,
    }
}
