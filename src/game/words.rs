use std::collections::HashSet;
use std::fs;
use std::path::Path;

use rand::seq::index;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::GameError;

pub const WORDS_PER_ROUND: usize = 3;

/// The three words of one round, in screen order: left, center, right.
pub type RoundWords = [String; WORDS_PER_ROUND];

/// Static word pool, loaded once per session.
#[derive(Debug, Clone, PartialEq)]
pub struct WordList {
    words: Vec<String>,
}

impl WordList {
    /// Trims entries, drops blanks and duplicates (first occurrence wins).
    pub fn new<I, S>(words: I) -> Result<Self, GameError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_string())
            .filter(|w| !w.is_empty())
            .filter(|w| seen.insert(w.clone()))
            .collect();

        if words.len() < WORDS_PER_ROUND {
            return Err(GameError::InsufficientWords { found: words.len() });
        }
        Ok(Self { words })
    }

    pub fn from_text(text: &str) -> Result<Self, GameError> {
        Self::new(text.lines())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GameError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| GameError::WordList {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_text(&text)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Draw three distinct words, avoiding `previous` where the pool allows.
    ///
    /// With at least three words outside `previous`, the round is drawn from
    /// those only. With one or two left over, they are all used and topped up
    /// from `previous`. With none left (a three-word list), the same words
    /// come back reshuffled.
    pub fn sample_round<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        previous: Option<&RoundWords>,
    ) -> RoundWords {
        let excluded: HashSet<&str> = previous
            .map(|p| p.iter().map(String::as_str).collect())
            .unwrap_or_default();

        let (fresh, reused): (Vec<&String>, Vec<&String>) = self
            .words
            .iter()
            .partition(|w| !excluded.contains(w.as_str()));

        let mut chosen: Vec<&String> = if fresh.len() >= WORDS_PER_ROUND {
            pick(rng, &fresh, WORDS_PER_ROUND)
        } else {
            let mut chosen = fresh.clone();
            chosen.extend(pick(rng, &reused, WORDS_PER_ROUND - fresh.len()));
            chosen
        };
        chosen.shuffle(rng);

        [
            chosen[0].clone(),
            chosen[1].clone(),
            chosen[2].clone(),
        ]
    }
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, pool: &[&'a String], amount: usize) -> Vec<&'a String> {
    index::sample(rng, pool.len(), amount)
        .into_iter()
        .map(|i| pool[i])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn distinct(words: &RoundWords) -> bool {
        words[0] != words[1] && words[1] != words[2] && words[0] != words[2]
    }

    #[test]
    fn loading_trims_and_skips_blank_lines() {
        let list = WordList::from_text("  cat \n\ndog\n   \nfish\r\n").unwrap();
        assert_eq!(list.words(), ["cat", "dog", "fish"]);
    }

    #[test]
    fn duplicates_do_not_count_towards_the_minimum() {
        let result = WordList::from_text("cat\ncat\ndog\n");
        assert!(matches!(result, Err(GameError::InsufficientWords { found: 2 })));
    }

    #[test]
    fn rounds_draw_distinct_words_from_the_list() {
        let list = WordList::from_text("a\nb\nc\nd\ne\nf\ng").unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut previous = None;
        for _ in 0..50 {
            let round = list.sample_round(&mut rng, previous.as_ref());
            assert!(distinct(&round));
            assert!(round.iter().all(|w| list.words().contains(w)));
            previous = Some(round);
        }
    }

    #[test]
    fn rounds_avoid_previous_words_when_pool_allows() {
        let list = WordList::from_text("a\nb\nc\nd\ne\nf").unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let mut previous = list.sample_round(&mut rng, None);
        for _ in 0..50 {
            let round = list.sample_round(&mut rng, Some(&previous));
            assert!(round.iter().all(|w| !previous.contains(w)));
            previous = round;
        }
    }

    #[test]
    fn small_pool_uses_every_fresh_word() {
        let list = WordList::from_text("a\nb\nc\nd").unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let previous: RoundWords = ["a".into(), "b".into(), "c".into()];
        let round = list.sample_round(&mut rng, Some(&previous));
        assert!(distinct(&round));
        assert!(round.contains(&"d".to_string()));
    }

    #[test]
    fn three_word_list_reshuffles() {
        let list = WordList::from_text("a\nb\nc").unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let previous: RoundWords = ["a".into(), "b".into(), "c".into()];
        let mut round = list.sample_round(&mut rng, Some(&previous));
        round.sort();
        assert_eq!(round, previous);
    }
}
