use super::{MAX_MATCH_LENGTH, MIN_MATCH_LENGTH};
use serde::Deserialize;
use std::{collections::HashSet, sync::LazyLock};
use thiserror::Error;

static INBUILT_TABLE: LazyLock<LevelTable> = LazyLock::new(|| {
    LevelTable::parse(include_str!("levels.toml")).expect("Failed to parse inbuilt level table")
});

pub const DEFAULT_LEVEL: u8 = 7;

/// Search effort for one compression level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LevelParams {
    pub level: u8,
    pub max_chain: usize,
    pub lazy: bool,
    /// Matches at least this long skip the lazy check.
    #[serde(default = "default_lazy_threshold")]
    pub lazy_threshold: usize,
}

fn default_lazy_threshold() -> usize {
    MAX_MATCH_LENGTH
}

#[derive(Debug, Clone, Deserialize)]
pub struct LevelTable {
    #[serde(rename = "level")]
    levels: Vec<LevelParams>,
}

#[derive(Error, Debug)]
pub enum LevelTableError {
    #[error("Failed to parse level table")]
    Parse(#[from] toml::de::Error),
    #[error("Level {0} is defined more than once")]
    DuplicateLevel(u8),
    #[error("Level {0} must examine at least one candidate")]
    EmptyChain(u8),
    #[error("Level {0} has a lazy threshold above the maximum match length")]
    ThresholdTooLarge(u8),
    #[error("Level {0} is lazy but its threshold is too low for any match to be checked")]
    ThresholdTooSmall(u8),
}

impl LevelTable {
    /// The table shipped with the crate, covering levels 6 to 9.
    pub fn inbuilt() -> &'static LevelTable {
        &INBUILT_TABLE
    }

    pub fn parse(table: &str) -> Result<LevelTable, LevelTableError> {
        let table: LevelTable = toml::de::from_str(table)?;

        let mut seen = HashSet::new();
        for params in &table.levels {
            if !seen.insert(params.level) {
                return Err(LevelTableError::DuplicateLevel(params.level));
            }
            if params.max_chain == 0 {
                return Err(LevelTableError::EmptyChain(params.level));
            }
            if params.lazy_threshold > MAX_MATCH_LENGTH {
                return Err(LevelTableError::ThresholdTooLarge(params.level));
            }
            if params.lazy && params.lazy_threshold <= MIN_MATCH_LENGTH {
                return Err(LevelTableError::ThresholdTooSmall(params.level));
            }
        }

        Ok(table)
    }

    pub fn get(&self, level: u8) -> Option<&LevelParams> {
        self.levels.iter().find(|params| params.level == level)
    }

    pub fn levels(&self) -> impl Iterator<Item = u8> + '_ {
        self.levels.iter().map(|params| params.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbuilt_table_covers_levels() {
        let table = LevelTable::inbuilt();
        assert_eq!(table.levels().collect::<Vec<_>>(), vec![6, 7, 8, 9]);
        assert!(table.get(DEFAULT_LEVEL).is_some());
        assert!(table.get(5).is_none());
        assert!(table.get(10).is_none());
    }

    #[test]
    fn inbuilt_effort_grows_with_level() {
        let table = LevelTable::inbuilt();
        let params = table
            .levels()
            .filter_map(|level| table.get(level))
            .collect::<Vec<_>>();

        for pair in params.windows(2) {
            assert!(pair[0].max_chain < pair[1].max_chain);
            if pair[0].lazy {
                assert!(pair[0].lazy_threshold <= pair[1].lazy_threshold);
            }
        }
        assert!(!params[0].lazy);
        assert!(params[1..].iter().all(|params| params.lazy));
    }

    #[test]
    fn rejects_duplicate_levels() {
        let table = "[[level]]\nlevel = 1\nmax_chain = 4\nlazy = false\n\n\
                     [[level]]\nlevel = 1\nmax_chain = 8\nlazy = false\n";
        assert!(matches!(
            LevelTable::parse(table),
            Err(LevelTableError::DuplicateLevel(1))
        ));
    }

    #[test]
    fn rejects_empty_chain() {
        let table = "[[level]]\nlevel = 3\nmax_chain = 0\nlazy = false\n";
        assert!(matches!(
            LevelTable::parse(table),
            Err(LevelTableError::EmptyChain(3))
        ));
    }

    #[test]
    fn rejects_large_threshold() {
        let table = "[[level]]\nlevel = 3\nmax_chain = 4\nlazy = true\nlazy_threshold = 300\n";
        assert!(matches!(
            LevelTable::parse(table),
            Err(LevelTableError::ThresholdTooLarge(3))
        ));
    }

    #[test]
    fn lazy_threshold_defaults_to_every_match() -> Result<(), LevelTableError> {
        let table = LevelTable::parse("[[level]]\nlevel = 1\nmax_chain = 8\nlazy = true\n")?;
        let params = table.get(1).copied();
        assert_eq!(
            params,
            Some(LevelParams {
                level: 1,
                max_chain: 8,
                lazy: true,
                lazy_threshold: MAX_MATCH_LENGTH,
            })
        );
        Ok(())
    }

    #[test]
    fn rejects_lazy_without_usable_threshold() {
        for threshold in [0, MIN_MATCH_LENGTH] {
            let table = format!(
                "[[level]]\nlevel = 4\nmax_chain = 8\nlazy = true\nlazy_threshold = {threshold}\n"
            );
            assert!(matches!(
                LevelTable::parse(&table),
                Err(LevelTableError::ThresholdTooSmall(4))
            ));
        }

        // irrelevant when the level is greedy
        let table = "[[level]]\nlevel = 4\nmax_chain = 8\nlazy = false\nlazy_threshold = 0\n";
        assert!(LevelTable::parse(table).is_ok());
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            LevelTable::parse("[[level]]\nlevel = \"fast\"\n"),
            Err(LevelTableError::Parse(_))
        ));
    }
}
