//! Cosmetic reply flair.
//!
//! Runs before the reply is archived, so the transcript records exactly what
//! the caller saw.

use rand::Rng;

use parley_config::FlairConfig;

/// Probabilistic slang-word suffix policy.
#[derive(Debug, Clone)]
pub struct FlairPolicy {
    enabled: bool,
    words: Vec<String>,
    probability: f64,
}

impl FlairPolicy {
    pub fn from_config(config: &FlairConfig) -> Self {
        Self {
            enabled: config.enabled,
            words: config.words.clone(),
            probability: config.probability.clamp(0.0, 1.0),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            words: Vec::new(),
            probability: 0.0,
        }
    }

    pub fn apply(&self, reply: String) -> String {
        if !self.enabled || self.words.is_empty() {
            return reply;
        }
        let mut rng = rand::thread_rng();
        if !rng.gen_bool(self.probability) {
            return reply;
        }
        let word = &self.words[rng.gen_range(0..self.words.len())];
        format!("{reply} {word}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(enabled: bool, probability: f64) -> FlairPolicy {
        FlairPolicy::from_config(&FlairConfig {
            enabled,
            words: vec!["innit".to_string(), "mate".to_string()],
            probability,
        })
    }

    #[test]
    fn certain_probability_always_appends() {
        let flair = policy(true, 1.0);
        for _ in 0..20 {
            let out = flair.apply("Hello".to_string());
            assert!(out == "Hello innit" || out == "Hello mate", "got {out}");
        }
    }

    #[test]
    fn zero_probability_never_appends() {
        let flair = policy(true, 0.0);
        for _ in 0..20 {
            assert_eq!(flair.apply("Hello".to_string()), "Hello");
        }
    }

    #[test]
    fn disabled_policy_is_identity() {
        let flair = policy(false, 1.0);
        assert_eq!(flair.apply("Hello".to_string()), "Hello");
        assert_eq!(FlairPolicy::disabled().apply("Hi".to_string()), "Hi");
    }

    #[test]
    fn out_of_range_probability_is_clamped() {
        let flair = policy(true, 7.5);
        let out = flair.apply("Hello".to_string());
        assert!(out.starts_with("Hello "));
    }
}
