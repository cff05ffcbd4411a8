use rand::Rng;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error as ThisError;

/// Enough for 2^64 elements with p = 1/4.
const MAX_LEVEL: usize = 32;
const P: f64 = 0.25;
/// The header sentinel always lives at the first arena slot.
const HEAD: usize = 0;

/// A member of a sorted set.
#[derive(Clone, Debug, PartialEq)]
pub struct Member {
    pub key: String,
    pub score: f64,
}

/// Options shared by the range queries. `offset` and `limit` apply after `reverse`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RangeOptions {
    pub reverse: bool,
    pub offset: usize,
    pub limit: Option<usize>,
}

/// One end of a score range. `-inf` and `+inf` are plain infinities.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoreBound {
    pub value: f64,
    pub exclusive: bool,
}

impl ScoreBound {
    pub fn inclusive(value: f64) -> ScoreBound {
        ScoreBound {
            value,
            exclusive: false,
        }
    }

    pub fn exclusive(value: f64) -> ScoreBound {
        ScoreBound {
            value,
            exclusive: true,
        }
    }

    fn admits_from_below(&self, score: f64) -> bool {
        if self.exclusive {
            score > self.value
        } else {
            score >= self.value
        }
    }

    fn admits_from_above(&self, score: f64) -> bool {
        if self.exclusive {
            score < self.value
        } else {
            score <= self.value
        }
    }
}

impl FromStr for ScoreBound {
    type Err = BoundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (value, exclusive) = match s.strip_prefix('(') {
            Some(rest) => (rest, true),
            None => (s, false),
        };

        match value.parse::<f64>() {
            Ok(value) if !value.is_nan() => Ok(ScoreBound { value, exclusive }),
            _ => Err(BoundError::Score),
        }
    }
}

/// One end of a lexicographic range.
#[derive(Clone, Debug, PartialEq)]
pub enum LexBound {
    /// `-`, lower than any member.
    Min,
    /// `+`, greater than any member.
    Max,
    Inclusive(String),
    Exclusive(String),
}

impl FromStr for LexBound {
    type Err = BoundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes().first() {
            Some(b'-') if s.len() == 1 => Ok(LexBound::Min),
            Some(b'+') if s.len() == 1 => Ok(LexBound::Max),
            Some(b'[') => Ok(LexBound::Inclusive(s[1..].to_string())),
            Some(b'(') => Ok(LexBound::Exclusive(s[1..].to_string())),
            _ => Err(BoundError::Lex),
        }
    }
}

#[derive(Debug, ThisError, PartialEq)]
pub enum BoundError {
    #[error("ERR min or max is not a float")]
    Score,
    #[error("ERR min or max not valid string range item")]
    Lex,
}

#[derive(Clone, Copy, Debug, Default)]
struct Level {
    forward: Option<usize>,
    /// Number of base level nodes the forward pointer skips, counting the node it lands on.
    span: usize,
}

#[derive(Clone, Debug)]
struct Node {
    key: String,
    score: f64,
    backward: Option<usize>,
    levels: Vec<Level>,
}

/// An ordered index of unique keys sorted by `(score, key)`.
///
/// Nodes live in an arena and link to each other by slot index. Every level pointer carries a
/// span, so the rank of a node is the sum of the spans walked to reach it. A map from key to slot
/// answers membership and score lookups without walking the list.
#[derive(Clone)]
pub struct SkipList {
    nodes: Vec<Node>,
    free: Vec<usize>,
    tail: Option<usize>,
    level: usize,
    length: usize,
    dict: HashMap<String, usize>,
}

impl SkipList {
    pub fn new() -> SkipList {
        let head = Node {
            key: String::new(),
            score: 0.0,
            backward: None,
            levels: vec![Level::default(); MAX_LEVEL],
        };

        SkipList {
            nodes: vec![head],
            free: Vec::new(),
            tail: None,
            level: 1,
            length: 0,
            dict: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        self.dict.contains_key(key)
    }

    pub fn score(&self, key: &str) -> Option<f64> {
        self.dict.get(key).map(|&index| self.nodes[index].score)
    }

    /// Inserts `key` or moves it to `score`. Returns true when the key was not present.
    ///
    /// The caller must not pass a NaN score.
    pub fn insert(&mut self, key: &str, score: f64) -> bool {
        match self.dict.get(key).copied() {
            Some(index) => {
                if self.nodes[index].score != score {
                    let old_score = self.nodes[index].score;
                    let update = self.predecessors(old_score, key);
                    self.unlink(index, &update);
                    let key = self.release(index);
                    let index = self.link(key.clone(), score);
                    self.dict.insert(key, index);
                }
                false
            }
            None => {
                let index = self.link(key.to_string(), score);
                self.dict.insert(key.to_string(), index);
                true
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Member> {
        let index = self.dict.remove(key)?;
        let score = self.nodes[index].score;

        let update = self.predecessors(score, key);
        self.unlink(index, &update);
        let key = self.release(index);

        Some(Member { key, score })
    }

    /// 1-based rank of `key` in ascending order, 0 when absent.
    pub fn rank(&self, key: &str) -> usize {
        let Some(&index) = self.dict.get(key) else {
            return 0;
        };
        let score = self.nodes[index].score;

        self.count_while(|node| compare(node, score, key) != Ordering::Greater)
    }

    pub fn peek_min(&self) -> Option<Member> {
        self.nodes[HEAD].levels[0]
            .forward
            .map(|index| self.member(index))
    }

    pub fn peek_max(&self) -> Option<Member> {
        self.tail.map(|index| self.member(index))
    }

    pub fn pop_min(&mut self) -> Option<Member> {
        let min = self.peek_min()?;
        self.remove(&min.key)
    }

    pub fn pop_max(&mut self) -> Option<Member> {
        let max = self.peek_max()?;
        self.remove(&max.key)
    }

    /// Members between the 1-based ranks `start` and `end`, both inclusive.
    ///
    /// Ranks count in the direction of `options.reverse`; negative ranks count back from the
    /// last member, so `(1, -1)` is everything. Out of range ranks are clamped.
    pub fn range_by_rank(&self, start: i64, end: i64, options: RangeOptions) -> Vec<Member> {
        let length = self.length as i64;
        let start = if start < 0 { length + start + 1 } else { start }.max(1);
        let end = if end < 0 { length + end + 1 } else { end }.min(length);

        if start > end {
            return Vec::new();
        }

        self.slice(start as usize, end as usize, options)
    }

    /// Members with a score between `min` and `max`. The bounds always describe the range in
    /// ascending terms; `options.reverse` only flips the order members are returned in.
    pub fn range_by_score(
        &self,
        min: ScoreBound,
        max: ScoreBound,
        options: RangeOptions,
    ) -> Vec<Member> {
        match self.score_ranks(min, max) {
            Some((first, last)) => self.slice_ascending(first, last, options),
            None => Vec::new(),
        }
    }

    /// Members between `min` and `max` in key order. Only meaningful when all members share the
    /// same score.
    pub fn range_by_lex(&self, min: &LexBound, max: &LexBound, options: RangeOptions) -> Vec<Member> {
        match self.lex_ranks(min, max) {
            Some((first, last)) => self.slice_ascending(first, last, options),
            None => Vec::new(),
        }
    }

    pub fn count_by_score(&self, min: ScoreBound, max: ScoreBound) -> usize {
        self.score_ranks(min, max)
            .map_or(0, |(first, last)| last - first + 1)
    }

    pub fn count_by_lex(&self, min: &LexBound, max: &LexBound) -> usize {
        self.lex_ranks(min, max)
            .map_or(0, |(first, last)| last - first + 1)
    }

    /// Ascending iterator over every member.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.nodes[HEAD].levels[0].forward,
        }
    }

    fn score_ranks(&self, min: ScoreBound, max: ScoreBound) -> Option<(usize, usize)> {
        let first = self.count_while(|node| !min.admits_from_below(node.score)) + 1;
        let last = self.count_while(|node| max.admits_from_above(node.score));

        (first <= last).then_some((first, last))
    }

    fn lex_ranks(&self, min: &LexBound, max: &LexBound) -> Option<(usize, usize)> {
        let first = match min {
            LexBound::Min => 1,
            LexBound::Max => return None,
            LexBound::Inclusive(key) => self.count_while(|node| node.key < *key) + 1,
            LexBound::Exclusive(key) => self.count_while(|node| node.key <= *key) + 1,
        };
        let last = match max {
            LexBound::Max => self.length,
            LexBound::Min => return None,
            LexBound::Inclusive(key) => self.count_while(|node| node.key <= *key),
            LexBound::Exclusive(key) => self.count_while(|node| node.key < *key),
        };

        (first <= last).then_some((first, last))
    }

    // Converts an ascending rank interval into positions in the requested direction.
    fn slice_ascending(&self, first: usize, last: usize, options: RangeOptions) -> Vec<Member> {
        if options.reverse {
            let length = self.length + 1;
            self.slice(length - last, length - first, options)
        } else {
            self.slice(first, last, options)
        }
    }

    // `first` and `last` are 1-based positions in the direction of `options.reverse`.
    fn slice(&self, first: usize, last: usize, options: RangeOptions) -> Vec<Member> {
        let first = first + options.offset;
        if first > last {
            return Vec::new();
        }

        let mut count = last - first + 1;
        if let Some(limit) = options.limit {
            count = count.min(limit);
        }

        let rank = if options.reverse {
            self.length + 1 - first
        } else {
            first
        };

        let mut members = Vec::with_capacity(count);
        let mut cursor = self.node_by_rank(rank);
        while let Some(index) = cursor {
            if members.len() == count {
                break;
            }
            members.push(self.member(index));

            let node = &self.nodes[index];
            cursor = if options.reverse {
                node.backward
            } else {
                node.levels[0].forward
            };
        }

        members
    }

    fn node_by_rank(&self, rank: usize) -> Option<usize> {
        if rank == 0 || rank > self.length {
            return None;
        }

        let mut traversed = 0;
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].levels[i].forward {
                if traversed + self.nodes[x].levels[i].span > rank {
                    break;
                }
                traversed += self.nodes[x].levels[i].span;
                x = next;
            }
            if traversed == rank {
                return Some(x);
            }
        }

        None
    }

    /// Length of the longest prefix of the list whose nodes satisfy `pred`. The predicate must
    /// hold for a prefix and fail for the rest.
    fn count_while(&self, pred: impl Fn(&Node) -> bool) -> usize {
        let mut rank = 0;
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].levels[i].forward {
                if !pred(&self.nodes[next]) {
                    break;
                }
                rank += self.nodes[x].levels[i].span;
                x = next;
            }
        }
        rank
    }

    /// Last node strictly before `(score, key)` at every level in use.
    fn predecessors(&self, score: f64, key: &str) -> [usize; MAX_LEVEL] {
        let mut update = [HEAD; MAX_LEVEL];
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].levels[i].forward {
                if compare(&self.nodes[next], score, key) != Ordering::Less {
                    break;
                }
                x = next;
            }
            update[i] = x;
        }
        update
    }

    fn link(&mut self, key: String, score: f64) -> usize {
        let mut update = [HEAD; MAX_LEVEL];
        let mut rank = [0usize; MAX_LEVEL];

        let mut x = HEAD;
        for i in (0..self.level).rev() {
            rank[i] = if i == self.level - 1 { 0 } else { rank[i + 1] };
            while let Some(next) = self.nodes[x].levels[i].forward {
                if compare(&self.nodes[next], score, &key) != Ordering::Less {
                    break;
                }
                rank[i] += self.nodes[x].levels[i].span;
                x = next;
            }
            update[i] = x;
        }

        let level = random_level();
        if level > self.level {
            for i in self.level..level {
                rank[i] = 0;
                update[i] = HEAD;
                self.nodes[HEAD].levels[i] = Level {
                    forward: None,
                    span: self.length,
                };
            }
            self.level = level;
        }

        let x = self.alloc(key, score, level);
        for i in 0..level {
            let prev = update[i];
            let skipped = rank[0] - rank[i];

            self.nodes[x].levels[i] = Level {
                forward: self.nodes[prev].levels[i].forward,
                span: self.nodes[prev].levels[i].span - skipped,
            };
            self.nodes[prev].levels[i] = Level {
                forward: Some(x),
                span: skipped + 1,
            };
        }

        // Levels above the new node now skip one more node.
        for i in level..self.level {
            self.nodes[update[i]].levels[i].span += 1;
        }

        self.nodes[x].backward = (update[0] != HEAD).then_some(update[0]);
        match self.nodes[x].levels[0].forward {
            Some(next) => self.nodes[next].backward = Some(x),
            None => self.tail = Some(x),
        }

        self.length += 1;
        x
    }

    fn unlink(&mut self, x: usize, update: &[usize; MAX_LEVEL]) {
        for i in 0..self.level {
            let prev = update[i];
            if self.nodes[prev].levels[i].forward == Some(x) {
                let removed = self.nodes[x].levels[i];
                let level = &mut self.nodes[prev].levels[i];
                level.span = level.span + removed.span - 1;
                level.forward = removed.forward;
            } else {
                self.nodes[prev].levels[i].span -= 1;
            }
        }

        match self.nodes[x].levels[0].forward {
            Some(next) => self.nodes[next].backward = self.nodes[x].backward,
            None => self.tail = self.nodes[x].backward,
        }

        while self.level > 1 && self.nodes[HEAD].levels[self.level - 1].forward.is_none() {
            self.level -= 1;
        }

        self.length -= 1;
    }

    fn alloc(&mut self, key: String, score: f64, level: usize) -> usize {
        let node = Node {
            key,
            score,
            backward: None,
            levels: vec![Level::default(); level],
        };

        match self.free.pop() {
            Some(index) => {
                self.nodes[index] = node;
                index
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    // Hands back the key of an unlinked node and recycles its slot.
    fn release(&mut self, index: usize) -> String {
        let node = &mut self.nodes[index];
        node.levels.clear();
        node.backward = None;
        self.free.push(index);
        std::mem::take(&mut node.key)
    }

    fn member(&self, index: usize) -> Member {
        let node = &self.nodes[index];
        Member {
            key: node.key.clone(),
            score: node.score,
        }
    }
}

impl Default for SkipList {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SkipList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

pub struct Iter<'a> {
    list: &'a SkipList,
    cursor: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, f64);

    fn next(&mut self) -> Option<Self::Item> {
        let node = &self.list.nodes[self.cursor?];
        self.cursor = node.levels[0].forward;
        Some((node.key.as_str(), node.score))
    }
}

fn compare(node: &Node, score: f64, key: &str) -> Ordering {
    node.score
        .partial_cmp(&score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| node.key.as_str().cmp(key))
}

fn random_level() -> usize {
    let mut rng = rand::thread_rng();
    let mut level = 1;
    while level < MAX_LEVEL && rng.gen_bool(P) {
        level += 1;
    }
    level
}
