use fxhash::FxHashMap;

/// Innovation registry. Every new path is handed the next innovation number, and a path seen
/// again by the same registry reuses its number. A registry lives for one generation, and the
/// next one continues from `head`.
#[derive(Debug, Clone, Default)]
pub struct InnoGen {
    pub head: u64,
    seen: FxHashMap<(usize, usize), u64>,
}

impl InnoGen {
    pub fn new(head: u64) -> Self {
        Self {
            head,
            seen: FxHashMap::default(),
        }
    }

    pub fn path(&mut self, v: (usize, usize)) -> u64 {
        match self.seen.get(&v) {
            Some(n) => *n,
            None => {
                let n = self.head;
                self.head += 1;
                self.seen.insert(v, n);
                n
            }
        }
    }
}
