//! Image classification as a fitness source.

use std::collections::HashMap;
use std::path::Path;

use crate::error::BoxError;

/// Class label to confidence score, as produced by a classifier.
pub type ClassScores = HashMap<String, f32>;

/// Scores a rendered image against a set of classes.
///
/// The population reads the score of its goal class as the fitness, so
/// scores are expected in `[0, 1]`.
pub trait FitnessEvaluator {
    /// Classify the image at `image`.
    ///
    /// # Errors
    ///
    /// Implementations report classifier or I/O failures.
    fn classify(&mut self, image: &Path) -> Result<ClassScores, BoxError>;
}

impl<F> FitnessEvaluator for F
where
    F: FnMut(&Path) -> Result<ClassScores, BoxError>,
{
    fn classify(&mut self, image: &Path) -> Result<ClassScores, BoxError> {
        self(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_an_evaluator() {
        let mut calls = 0;
        let mut evaluator = |path: &Path| -> Result<ClassScores, BoxError> {
            calls += 1;
            let score = if path.ends_with("good.png") { 0.9 } else { 0.1 };
            Ok(HashMap::from([("cat".to_string(), score)]))
        };

        let good = evaluator.classify(Path::new("pop/good.png")).unwrap();
        let bad = evaluator.classify(Path::new("pop/bad.png")).unwrap();
        assert_eq!(good["cat"], 0.9);
        assert_eq!(bad["cat"], 0.1);
        assert_eq!(calls, 2);
    }
}
