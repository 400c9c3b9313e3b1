//! Hash-chain match finder with optional one-step lazy evaluation.
//!
//! Every position with at least [`MIN_MATCH_LENGTH`] bytes left is hashed on
//! its 3-byte prefix. `head` holds the most recent position per hash bucket,
//! and `chain` holds, for each position, the distance back to the previous
//! position in the same bucket. `chain` is a ring indexed by position, sized
//! at twice the window so an entry is never overwritten while it can still be
//! reached from a position inside the window.
//!
//! Inside a run of a single byte every position lands in the same bucket,
//! one step apart. When both the searched position and the candidate sit in
//! such a run the walk jumps straight to the candidate whose run matches,
//! instead of spending one step of chain depth per byte of the run.

use super::{LevelParams, Token, MAX_MATCH_LENGTH, MIN_MATCH_LENGTH, WINDOW_SIZE};

const HASH_LOG: u32 = 15;
const HASH_SIZE: usize = 1 << HASH_LOG;

const CHAIN_SIZE: usize = WINDOW_SIZE * 2;
const CHAIN_MASK: usize = CHAIN_SIZE - 1;

const EMPTY: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub offset: usize,
    pub length: usize,
}

impl From<Match> for Token {
    fn from(m: Match) -> Self {
        Token::Match {
            offset: m.offset as u16,
            length: m.length as u16,
        }
    }
}

/// Knuth multiplicative hash of the 3 bytes at `pos`.
#[inline]
fn hash3(src: &[u8], pos: usize) -> usize {
    let key = u32::from(src[pos]) << 16 | u32::from(src[pos + 1]) << 8 | u32::from(src[pos + 2]);
    (key.wrapping_mul(2_654_435_761) >> (32 - HASH_LOG)) as usize
}

/// Number of equal bytes at `candidate` and `pos`, up to `limit`.
///
/// `candidate < pos`, so the candidate run may extend into `pos` itself.
#[inline]
fn common_prefix(src: &[u8], candidate: usize, pos: usize, limit: usize) -> usize {
    src[candidate..]
        .iter()
        .zip(&src[pos..])
        .take(limit)
        .take_while(|(a, b)| a == b)
        .count()
}

pub struct MatchFinder<'a> {
    src: &'a [u8],
    params: LevelParams,

    head: Vec<u32>,
    chain: Vec<u16>,

    /// first position not yet in the index
    next_to_insert: usize,
}

impl<'a> MatchFinder<'a> {
    /// `src` must be shorter than `u32::MAX` bytes.
    pub fn new(src: &'a [u8], params: LevelParams) -> Self {
        debug_assert!(src.len() < EMPTY as usize);

        Self {
            src,
            params,

            head: vec![EMPTY; HASH_SIZE],
            chain: vec![0; CHAIN_SIZE],

            next_to_insert: 0,
        }
    }

    /// Index every position before `target`.
    fn insert_up_to(&mut self, target: usize) {
        // the last two positions have no full prefix to hash
        let end = target.min(self.src.len().saturating_sub(MIN_MATCH_LENGTH - 1));

        while self.next_to_insert < end {
            let pos = self.next_to_insert;
            let bucket = hash3(self.src, pos);

            let previous = self.head[bucket];
            let delta = if previous == EMPTY {
                0
            } else {
                pos - previous as usize
            };

            // 0 terminates the chain, nothing further back is reachable anyway
            self.chain[pos & CHAIN_MASK] = if delta > WINDOW_SIZE { 0 } else { delta as u16 };
            self.head[bucket] = pos as u32;

            self.next_to_insert += 1;
        }
    }

    /// Longest match for `pos` among indexed positions, closest one on ties.
    fn find(&self, pos: usize) -> Option<Match> {
        let limit = (self.src.len() - pos).min(MAX_MATCH_LENGTH);
        if limit < MIN_MATCH_LENGTH {
            return None;
        }

        let mut best: Option<Match> = None;
        let mut candidate = self.head[hash3(self.src, pos)];
        let mut searched = 0;

        let byte = self.src[pos];
        let run = self.src[pos..]
            .iter()
            .take(limit)
            .take_while(|&&b| b == byte)
            .count();
        let lowest = pos.saturating_sub(WINDOW_SIZE);

        while candidate != EMPTY && searched < self.params.max_chain {
            let candidate_pos = candidate as usize;
            debug_assert!(candidate_pos < pos);

            let offset = pos - candidate_pos;
            if offset > WINDOW_SIZE {
                break;
            }
            searched += 1;

            // chain order is nearest first, so only a strictly longer match replaces the best
            let length = common_prefix(self.src, candidate_pos, pos, limit);
            if length >= MIN_MATCH_LENGTH && best.map_or(true, |best| length > best.length) {
                best = Some(Match { offset, length });
                if length == limit {
                    break;
                }
            }

            let delta = match self.chain[candidate_pos & CHAIN_MASK] {
                0 => break,
                delta => delta as usize,
            };
            let skipped = if delta == 1 && run >= MIN_MATCH_LENGTH {
                self.skip_run(candidate_pos, byte, run, lowest)
            } else {
                None
            };
            candidate = skipped.unwrap_or(candidate_pos - delta) as u32;
        }

        best
    }

    /// Next candidate worth comparing when `candidate` sits in a run of `byte`
    /// and the searched position starts a run of `run` such bytes.
    ///
    /// No position skipped over gives a longer match than `candidate` or the
    /// returned one.
    fn skip_run(&self, candidate: usize, byte: u8, run: usize, lowest: usize) -> Option<usize> {
        let ahead = self.src[candidate..]
            .iter()
            .take(run)
            .take_while(|&&b| b == byte)
            .count();
        if ahead < MIN_MATCH_LENGTH {
            return None;
        }

        let behind = self.src[lowest..candidate]
            .iter()
            .rev()
            .take_while(|&&b| b == byte)
            .count();
        let start = candidate - behind;

        let target = if ahead < run {
            (candidate + ahead).saturating_sub(run).max(start)
        } else {
            start
        };

        (target < candidate).then_some(target)
    }

    /// A strictly longer match one position ahead, if the level asks for the check.
    fn lazy_candidate(&mut self, pos: usize, current: Match) -> Option<Match> {
        if !self.params.lazy
            || current.length >= self.params.lazy_threshold
            || pos + 1 >= self.src.len()
        {
            return None;
        }

        self.insert_up_to(pos + 1);
        self.find(pos + 1).filter(|next| next.length > current.length)
    }

    /// Split the whole input into literals and matches.
    pub fn parse(mut self) -> Vec<Token> {
        let mut tokens = Vec::with_capacity(self.src.len() / 2);
        let mut pos = 0;
        // match found for `pos` by the previous lazy check
        let mut pending: Option<Match> = None;

        while pos < self.src.len() {
            self.insert_up_to(pos);

            let current = match pending.take() {
                Some(current) => Some(current),
                None => self.find(pos),
            };

            let Some(current) = current else {
                tokens.push(Token::Literal(self.src[pos]));
                pos += 1;
                continue;
            };

            if let Some(next) = self.lazy_candidate(pos, current) {
                tokens.push(Token::Literal(self.src[pos]));
                pending = Some(next);
                pos += 1;
                continue;
            }

            tokens.push(current.into());
            pos += current.length;
        }

        tokens
    }
}
