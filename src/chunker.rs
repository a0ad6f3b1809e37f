use itertools::Itertools;

/// Words per typed line.
pub const WORDS_PER_LINE: usize = 5;

/// Groups the shuffled word pool into typed lines of five words, every
/// word followed by a single space (the last one included). The final
/// line may hold fewer than five words. Order is inherited from the pool.
pub fn chunk_lines(words: &[String]) -> Vec<String> {
    words
        .iter()
        .chunks(WORDS_PER_LINE)
        .into_iter()
        .map(|line| line.map(|word| format!("{word} ")).collect())
        .collect()
}
