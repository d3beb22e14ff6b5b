//! Example prompts offered to the user, rotated after each completed answer

use rand::seq::SliceRandom;

/// How many examples are shown at once
pub const EXAMPLES_PER_ROTATION: usize = 3;

/// Fixed pool the examples are drawn from
pub static EXAMPLE_PROMPTS: [&str; 15] = [
    "Explain APIs like I'm five",
    "What is the difference between TCP and UDP?",
    "Write a haiku about version control",
    "Summarize the causes of the French Revolution",
    "How does public-key cryptography work?",
    "Give me three tips for writing clean code",
    "What is a closure in programming?",
    "Explain the CAP theorem with an example",
    "Suggest a weekend itinerary for Lisbon",
    "How do vaccines train the immune system?",
    "Compare SQL and NoSQL databases",
    "What makes a good code review?",
    "Explain recursion using a real-world analogy",
    "Draft a polite follow-up email after an interview",
    "What is the difference between concurrency and parallelism?",
];

/// Ordered set of distinct example prompts, replaced wholesale on rotation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExampleSet(Vec<String>);

impl ExampleSet {
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct ExampleSampler {
    pool: Vec<String>,
}

impl Default for ExampleSampler {
    fn default() -> Self {
        Self::new(EXAMPLE_PROMPTS.iter().map(|s| (*s).to_string()))
    }
}

impl ExampleSampler {
    /// Duplicate pool entries are collapsed
    #[must_use]
    pub fn new(pool: impl IntoIterator<Item = String>) -> Self {
        let mut unique: Vec<String> = Vec::new();
        for item in pool {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        Self { pool: unique }
    }

    #[must_use]
    pub fn pool(&self) -> &[String] {
        &self.pool
    }

    /// Draw `n` distinct entries uniformly, never returning `exclude`.
    ///
    /// When fewer than `n` remain after exclusion, all of them are returned.
    #[must_use]
    pub fn sample(&self, n: usize, exclude: Option<&str>) -> ExampleSet {
        let candidates: Vec<&String> = self
            .pool
            .iter()
            .filter(|item| exclude != Some(item.as_str()))
            .collect();

        let mut rng = rand::thread_rng();
        let picked = candidates
            .choose_multiple(&mut rng, n.min(candidates.len()))
            .map(|s| (*s).clone())
            .collect();
        ExampleSet(picked)
    }
}
