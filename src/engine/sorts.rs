//! Instrumented sorting algorithms.
//!
//! Each algorithm runs against the `Stepper`'s working vector and calls
//! `checkpoint` before every comparison or swap, so pause/cancel is observed
//! at every step boundary regardless of which algorithm is animating.

use crate::engine::stepper::{StepKind, Stepper};
use crate::model::{Algorithm, Cancelled};
use futures::future::BoxFuture;

pub(crate) async fn run_algorithm(algo: Algorithm, st: &mut Stepper) -> Result<(), Cancelled> {
    match algo {
        Algorithm::Bubble => bubble_sort(st).await,
        Algorithm::Selection => selection_sort(st).await,
        Algorithm::Insertion => insertion_sort(st).await,
        Algorithm::Merge => merge_sort(st).await,
        Algorithm::Heap => heap_sort(st).await,
    }
}

async fn bubble_sort(st: &mut Stepper) -> Result<(), Cancelled> {
    let n = st.values.len();
    for i in 0..n.saturating_sub(1) {
        for j in 0..n - i - 1 {
            st.checkpoint().await?;
            st.mark(Some(j), Some(j + 1));
            st.comparisons += 1;
            if st.values[j] > st.values[j + 1] {
                st.swap(j, j + 1);
                st.step(StepKind::Swap).await;
            } else {
                st.step(StepKind::Compare).await;
            }
        }
    }
    Ok(())
}

async fn selection_sort(st: &mut Stepper) -> Result<(), Cancelled> {
    let n = st.values.len();
    for i in 0..n.saturating_sub(1) {
        let mut min = i;
        st.mark(Some(i), None);

        for j in i + 1..n {
            st.checkpoint().await?;
            st.mark(Some(i), Some(j));
            st.comparisons += 1;
            if st.values[j] < st.values[min] {
                min = j;
            }
            st.step(StepKind::Compare).await;
        }

        // One swap per outer iteration, into the found minimum.
        st.checkpoint().await?;
        st.mark(Some(i), Some(min));
        st.swap(i, min);
        st.step(StepKind::Swap).await;
    }
    Ok(())
}

async fn insertion_sort(st: &mut Stepper) -> Result<(), Cancelled> {
    let n = st.values.len();
    for i in 1..n {
        let key = st.values[i];
        let mut j = i;

        // Shift greater elements one position right until the slot for key opens.
        while j > 0 && st.values[j - 1] > key {
            st.checkpoint().await?;
            st.mark(Some(i), Some(j - 1));
            st.comparisons += 1;
            st.values[j] = st.values[j - 1];
            st.swaps += 1;
            j -= 1;
            st.step(StepKind::Swap).await;
        }

        st.checkpoint().await?;
        st.mark(Some(i), Some(j));
        st.values[j] = key;
        st.step(StepKind::Swap).await;
    }
    Ok(())
}

async fn merge_sort(st: &mut Stepper) -> Result<(), Cancelled> {
    let n = st.values.len();
    if n < 2 {
        return Ok(());
    }
    // One auxiliary buffer for the whole run, shared by every recursive frame.
    let mut buf = vec![0i32; n];
    merge_sort_range(st, &mut buf, 0, n - 1).await
}

fn merge_sort_range<'a>(
    st: &'a mut Stepper,
    buf: &'a mut Vec<i32>,
    left: usize,
    right: usize,
) -> BoxFuture<'a, Result<(), Cancelled>> {
    Box::pin(async move {
        st.checkpoint().await?;
        if left >= right {
            return Ok(());
        }

        let mid = (left + right) / 2;
        merge_sort_range(st, buf, left, mid).await?;
        merge_sort_range(st, buf, mid + 1, right).await?;
        merge(st, buf, left, mid, right).await?;
        st.step(StepKind::Swap).await;
        Ok(())
    })
}

async fn merge(
    st: &mut Stepper,
    buf: &mut [i32],
    left: usize,
    mid: usize,
    right: usize,
) -> Result<(), Cancelled> {
    buf[..=right - left].copy_from_slice(&st.values[left..=right]);

    let mut i = left;
    let mut j = mid + 1;
    let mut k = 0usize;

    while i <= mid && j <= right {
        st.checkpoint().await?;
        st.mark(Some(i), Some(j));
        st.step(StepKind::Compare).await;

        st.comparisons += 1;
        if buf[i - left] <= buf[j - left] {
            st.values[left + k] = buf[i - left];
            i += 1;
        } else {
            st.values[left + k] = buf[j - left];
            j += 1;
        }
        st.swaps += 1;
        k += 1;
    }

    // Drain whichever half still has elements.
    while i <= mid {
        st.checkpoint().await?;
        st.mark(Some(i), None);
        st.values[left + k] = buf[i - left];
        st.swaps += 1;
        i += 1;
        k += 1;
        st.step(StepKind::Copy).await;
    }
    while j <= right {
        st.checkpoint().await?;
        st.mark(None, Some(j));
        st.values[left + k] = buf[j - left];
        st.swaps += 1;
        j += 1;
        k += 1;
        st.step(StepKind::Copy).await;
    }
    Ok(())
}

async fn heap_sort(st: &mut Stepper) -> Result<(), Cancelled> {
    let n = st.values.len();
    if n < 2 {
        return Ok(());
    }

    // Build the max-heap bottom-up.
    for i in (0..n / 2).rev() {
        st.checkpoint().await?;
        st.mark(Some(i), None);
        heapify(st, n, i).await?;
        st.step(StepKind::Swap).await;
    }

    // Repeatedly move the root past the shrinking heap boundary.
    for i in (1..n).rev() {
        st.checkpoint().await?;
        st.mark(Some(0), Some(i));
        st.swap(0, i);
        st.step(StepKind::Swap).await;
        heapify(st, i, 0).await?;
    }
    Ok(())
}

fn heapify(st: &mut Stepper, n: usize, i: usize) -> BoxFuture<'_, Result<(), Cancelled>> {
    Box::pin(async move {
        let mut largest = i;
        let left = 2 * i + 1;
        let right = 2 * i + 2;

        if left < n {
            st.checkpoint().await?;
            st.mark(Some(i), Some(left));
            st.step(StepKind::Compare).await;
            st.comparisons += 1;
            if st.values[left] > st.values[largest] {
                largest = left;
            }
        }

        if right < n {
            st.checkpoint().await?;
            st.mark(Some(i), Some(right));
            st.step(StepKind::Compare).await;
            st.comparisons += 1;
            if st.values[right] > st.values[largest] {
                largest = right;
            }
        }

        if largest != i {
            st.checkpoint().await?;
            st.mark(Some(i), Some(largest));
            st.swap(i, largest);
            st.step(StepKind::Swap).await;
            heapify(st, n, largest).await?;
        }
        Ok(())
    })
}
