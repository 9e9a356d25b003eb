//! Sorting translator.
//!
//! The algorithm is read off the code (`min_idx` means selection sort,
//! `pivot` means quick sort, ...) and then run on the extracted array,
//! recording a step for every comparison and every write. Comparisons are
//! strict, so equal elements are never swapped by bubble or insertion sort.

use algomap_core::{Concept, Meta, SortKind, Step, Translation};
use serde_json::Value;

use crate::error::TranslateError;
use crate::extract;
use crate::translator::Translator;

/// Sort algorithm implied by literal code patterns, if any.
pub fn detect(code: &str) -> Option<SortKind> {
    let compact: String = code.split_whitespace().collect();
    if code.contains("min_idx") || code.contains("min_index") {
        Some(SortKind::Selection)
    } else if code.contains("key") && compact.contains("whilej>=") {
        Some(SortKind::Insertion)
    } else if code.contains("pivot") || code.contains("partition(") {
        Some(SortKind::Quick)
    } else if code.contains("heapify") || code.contains("heapq") {
        Some(SortKind::Heap)
    } else if code.contains("merge_sort(") && code.contains("mid") {
        Some(SortKind::Merge)
    } else {
        None
    }
}

struct Recorder {
    arr: Vec<i64>,
    steps: Vec<Step>,
}

impl Recorder {
    fn step(&mut self, action: &str, description: String, i: Option<usize>, j: Option<usize>) {
        let idx = |x: Option<usize>| x.map_or(Value::Null, Value::from);
        let step = Step::new(action, description)
            .with_var("arr", self.arr.clone())
            .with_var("i", idx(i))
            .with_var("j", idx(j))
            .with_var("n", self.arr.len());
        self.steps.push(step);
    }

    fn compare(&mut self, i: usize, j: usize) {
        let d = format!("Compare arr[{i}] = {} with arr[{j}] = {}", self.arr[i], self.arr[j]);
        self.step("compare", d, Some(i), Some(j));
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.arr.swap(i, j);
        let d = format!("Swap arr[{i}] and arr[{j}]: now {} and {}", self.arr[i], self.arr[j]);
        self.step("swap", d, Some(i), Some(j));
    }

    fn bubble(&mut self) {
        let n = self.arr.len();
        for i in 0..n.saturating_sub(1) {
            let mut swapped = false;
            for j in 0..n - 1 - i {
                self.compare(j, j + 1);
                if self.arr[j] > self.arr[j + 1] {
                    self.swap(j, j + 1);
                    swapped = true;
                }
            }
            if !swapped {
                break;
            }
        }
    }

    fn selection(&mut self) {
        let n = self.arr.len();
        for i in 0..n.saturating_sub(1) {
            let mut min_idx = i;
            for j in i + 1..n {
                self.compare(min_idx, j);
                if self.arr[j] < self.arr[min_idx] {
                    min_idx = j;
                    let d = format!("New minimum {} at index {j}", self.arr[j]);
                    self.step("select_min", d, Some(i), Some(j));
                }
            }
            if min_idx != i {
                self.swap(i, min_idx);
            }
        }
    }

    fn insertion(&mut self) {
        for i in 1..self.arr.len() {
            let key = self.arr[i];
            self.step("select_key", format!("Take key {key} from index {i}"), Some(i), None);
            let mut j = i;
            while j > 0 {
                let d = format!("Compare arr[{}] = {} with key {key}", j - 1, self.arr[j - 1]);
                self.step("compare", d, Some(i), Some(j - 1));
                if self.arr[j - 1] <= key {
                    break;
                }
                self.arr[j] = self.arr[j - 1];
                let d = format!("Shift {} right to index {j}", self.arr[j]);
                self.step("shift", d, Some(i), Some(j));
                j -= 1;
            }
            if j != i {
                self.arr[j] = key;
                self.step("insert", format!("Insert key {key} at index {j}"), Some(i), Some(j));
            }
        }
    }

    fn merge_sort(&mut self, lo: usize, hi: usize) {
        if hi - lo < 2 {
            return;
        }
        let mid = lo + (hi - lo) / 2;
        self.merge_sort(lo, mid);
        self.merge_sort(mid, hi);

        let left = self.arr[lo..mid].to_vec();
        let right = self.arr[mid..hi].to_vec();
        let (mut a, mut b, mut k) = (0, 0, lo);
        while a < left.len() && b < right.len() {
            let d = format!("Compare {} (left) with {} (right)", left[a], right[b]);
            self.step("compare", d, Some(lo + a), Some(mid + b));
            // left wins ties to stay stable
            if right[b] < left[a] {
                self.arr[k] = right[b];
                b += 1;
            } else {
                self.arr[k] = left[a];
                a += 1;
            }
            k += 1;
        }
        for &v in left[a..].iter().chain(&right[b..]) {
            self.arr[k] = v;
            k += 1;
        }
        let d = format!("Merge indices {lo}..{} into {:?}", hi - 1, &self.arr[lo..hi]);
        self.step("merge", d, Some(lo), Some(hi - 1));
    }

    fn quick_sort(&mut self, lo: usize, hi: usize) {
        if lo >= hi {
            return;
        }
        let pivot = self.arr[hi];
        self.step("pivot", format!("Choose pivot {pivot} at index {hi}"), Some(lo), Some(hi));
        let mut store = lo;
        for j in lo..hi {
            self.compare(j, hi);
            if self.arr[j] < pivot {
                if store != j {
                    self.swap(store, j);
                }
                store += 1;
            }
        }
        if store != hi {
            self.swap(store, hi);
        }
        let d = format!("Pivot {pivot} placed at index {store}");
        self.step("partition", d, Some(store), None);
        if store > lo {
            self.quick_sort(lo, store - 1);
        }
        self.quick_sort(store + 1, hi);
    }

    fn sift_down(&mut self, mut root: usize, end: usize) {
        let d = format!("Heapify subtree at index {root}");
        self.step("heapify", d, Some(root), None);
        loop {
            let mut largest = root;
            for child in [2 * root + 1, 2 * root + 2] {
                if child < end {
                    self.compare(largest, child);
                    if self.arr[child] > self.arr[largest] {
                        largest = child;
                    }
                }
            }
            if largest == root {
                return;
            }
            self.swap(root, largest);
            root = largest;
        }
    }

    fn heap_sort(&mut self) {
        let n = self.arr.len();
        for root in (0..n / 2).rev() {
            self.sift_down(root, n);
        }
        for end in (1..n).rev() {
            self.swap(0, end);
            self.sift_down(0, end);
        }
    }

    fn run(&mut self, kind: SortKind) {
        let n = self.arr.len();
        match kind {
            SortKind::Selection => self.selection(),
            SortKind::Insertion => self.insertion(),
            SortKind::Merge => self.merge_sort(0, n),
            SortKind::Quick if n > 0 => self.quick_sort(0, n - 1),
            SortKind::Quick => {}
            SortKind::Heap => self.heap_sort(),
            SortKind::Bubble | SortKind::Generic => self.bubble(),
        }
        for k in 0..n {
            let d = format!("Index {k} holds its final value {}", self.arr[k]);
            self.step("mark_sorted", d, Some(k), None);
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SortTranslator {
    kind: SortKind,
}

impl SortTranslator {
    pub fn new(kind: SortKind) -> Self {
        Self { kind }
    }

    /// A detected pattern wins over the requested variant; a generic
    /// request with no pattern runs bubble sort.
    pub fn algorithm(&self, code: &str) -> SortKind {
        match (detect(code), self.kind) {
            (Some(found), _) => found,
            (None, SortKind::Generic) => SortKind::Bubble,
            (None, requested) => requested,
        }
    }
}

impl Translator for SortTranslator {
    fn name(&self) -> &'static str {
        "sort"
    }

    fn simulate(&self, code: &str, _concept: &Concept) -> Result<Translation, TranslateError> {
        let kind = self.algorithm(code);
        let initial = extract::extract_array_or_default(code);
        let mut rec = Recorder {
            arr: initial.clone(),
            steps: Vec::new(),
        };
        let d = format!("Array to sort: {initial:?}");
        rec.step("set_array", d, None, None);
        rec.run(kind);

        let meta = Meta::new(Concept::Sorting(kind))
            .with_extra("algorithm", kind.name())
            .with_extra("initial", initial);
        Ok(Translation::new(rec.steps, meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(code: &str, kind: SortKind) -> Translation {
        SortTranslator::new(kind)
            .simulate(code, &Concept::Sorting(kind))
            .unwrap()
    }

    const BUBBLE: &str = "\
arr = [5, 3, 8, 1, 2]
n = len(arr)
for i in range(n):
    for j in range(0, n - i - 1):
        if arr[j] > arr[j + 1]:
            arr[j], arr[j + 1] = arr[j + 1], arr[j]
";

    #[test]
    fn bubble_sort_scenario() {
        let t = run(BUBBLE, SortKind::Generic);
        assert_eq!(t.meta.kind, Concept::Sorting(SortKind::Bubble));
        let first = t.steps.iter().find(|s| s.action == "compare").unwrap();
        assert_eq!((first.vars["i"].clone(), first.vars["j"].clone()), (json!(0), json!(1)));
        let last = t.steps.last().unwrap();
        assert_eq!(last.action, "mark_sorted");
        assert_eq!(last.vars["arr"], json!([1, 2, 3, 5, 8]));
        assert_eq!(t.steps.iter().filter(|s| s.action == "mark_sorted").count(), 5);
    }

    #[test]
    fn detection_order() {
        assert_eq!(detect("min_idx = i"), Some(SortKind::Selection));
        assert_eq!(detect("key = a[i]\nwhile j >= 0 and a[j] > key:"), Some(SortKind::Insertion));
        assert_eq!(detect("pivot = a[hi]"), Some(SortKind::Quick));
        assert_eq!(detect("import heapq"), Some(SortKind::Heap));
        assert_eq!(detect("mid = len(a)//2\nmerge_sort(a[:mid])"), Some(SortKind::Merge));
        assert_eq!(detect("for i in range(n):"), None);
    }

    #[test]
    fn requested_variant_applies_without_patterns() {
        let t = run("nums = [3, 1, 2]\nsort(nums)\n", SortKind::Quick);
        assert_eq!(t.meta.extra["algorithm"], SortKind::Quick.name());
        assert_eq!(t.steps.last().unwrap().vars["arr"], json!([1, 2, 3]));
    }

    #[test]
    fn every_algorithm_sorts() {
        for kind in [
            SortKind::Bubble,
            SortKind::Selection,
            SortKind::Insertion,
            SortKind::Merge,
            SortKind::Quick,
            SortKind::Heap,
        ] {
            let t = run("arr = [4, 2, 7, 2, 9, 1]", kind);
            assert_eq!(
                t.steps.last().unwrap().vars["arr"],
                json!([1, 2, 2, 4, 7, 9]),
                "{kind:?}"
            );
        }
    }

    #[test]
    fn fallback_array_when_none_declared() {
        let t = run("def sort(a):\n    pass\n", SortKind::Bubble);
        assert_eq!(t.meta.extra["initial"], json!([5, 3, 8, 1, 2]));
    }
}
