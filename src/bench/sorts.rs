//! Plain reference sorts used for timing trials (no instrumentation, no delays).

use crate::model::Algorithm;

pub(crate) fn sort(algo: Algorithm, values: &mut [i32]) {
    match algo {
        Algorithm::Bubble => bubble_sort(values),
        Algorithm::Selection => selection_sort(values),
        Algorithm::Insertion => insertion_sort(values),
        Algorithm::Merge => merge_sort(values),
        Algorithm::Heap => heap_sort(values),
    }
}

fn bubble_sort(a: &mut [i32]) {
    let n = a.len();
    for i in 0..n.saturating_sub(1) {
        let mut swapped = false;
        for j in 0..n - i - 1 {
            if a[j] > a[j + 1] {
                a.swap(j, j + 1);
                swapped = true;
            }
        }
        if !swapped {
            break;
        }
    }
}

fn selection_sort(a: &mut [i32]) {
    let n = a.len();
    for i in 0..n.saturating_sub(1) {
        let mut min = i;
        for j in i + 1..n {
            if a[j] < a[min] {
                min = j;
            }
        }
        a.swap(i, min);
    }
}

fn insertion_sort(a: &mut [i32]) {
    for i in 1..a.len() {
        let key = a[i];
        let mut j = i;
        while j > 0 && a[j - 1] > key {
            a[j] = a[j - 1];
            j -= 1;
        }
        a[j] = key;
    }
}

fn merge_sort(a: &mut [i32]) {
    let n = a.len();
    if n < 2 {
        return;
    }
    let mut tmp = vec![0i32; n];
    merge_sort_range(a, &mut tmp, 0, n - 1);
}

fn merge_sort_range(a: &mut [i32], tmp: &mut [i32], l: usize, r: usize) {
    if l >= r {
        return;
    }
    let m = (l + r) / 2;
    merge_sort_range(a, tmp, l, m);
    merge_sort_range(a, tmp, m + 1, r);
    merge(a, tmp, l, m, r);
}

fn merge(a: &mut [i32], tmp: &mut [i32], l: usize, m: usize, r: usize) {
    let (mut i, mut j, mut k) = (l, m + 1, l);
    while i <= m && j <= r {
        if a[i] <= a[j] {
            tmp[k] = a[i];
            i += 1;
        } else {
            tmp[k] = a[j];
            j += 1;
        }
        k += 1;
    }
    while i <= m {
        tmp[k] = a[i];
        i += 1;
        k += 1;
    }
    while j <= r {
        tmp[k] = a[j];
        j += 1;
        k += 1;
    }
    a[l..=r].copy_from_slice(&tmp[l..=r]);
}

fn heap_sort(a: &mut [i32]) {
    let n = a.len();
    if n < 2 {
        return;
    }
    for i in (0..n / 2).rev() {
        heapify(a, n, i);
    }
    for i in (1..n).rev() {
        a.swap(0, i);
        heapify(a, i, 0);
    }
}

fn heapify(a: &mut [i32], n: usize, i: usize) {
    let mut largest = i;
    let l = 2 * i + 1;
    let r = 2 * i + 2;
    if l < n && a[l] > a[largest] {
        largest = l;
    }
    if r < n && a[r] > a[largest] {
        largest = r;
    }
    if largest != i {
        a.swap(i, largest);
        heapify(a, n, largest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn every_plain_sort_matches_the_standard_library() {
        let mut rng = rand::thread_rng();
        for algo in Algorithm::ALL {
            let input: Vec<i32> = (0..200).map(|_| rng.gen()).collect();
            let mut expected = input.clone();
            expected.sort_unstable();

            let mut got = input;
            sort(algo, &mut got);
            assert_eq!(got, expected, "{algo:?} plain sort diverged");
        }
    }

    #[test]
    fn degenerate_inputs_are_handled() {
        for algo in Algorithm::ALL {
            let mut empty: Vec<i32> = vec![];
            sort(algo, &mut empty);
            assert!(empty.is_empty());

            let mut single = vec![7];
            sort(algo, &mut single);
            assert_eq!(single, vec![7]);
        }
    }
}
