#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit { pub id: usize, pub distance: f32 }

/// Stable nearest-first top-k by (distance asc, id asc) for determinism.
pub fn stable_top_k(mut hits: Vec<Hit>, k: usize) -> Vec<Hit> {
    hits.sort_by(|a, b| {
        match a.distance.partial_cmp(&b.distance) {
            Some(std::cmp::Ordering::Equal) | None => a.id.cmp(&b.id),
            Some(ord) => ord,
        }
    });
    hits.truncate(k.min(hits.len()));
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_break_by_id_ascending() {
        let hits = vec![
            Hit { id: 7, distance: 0.5 },
            Hit { id: 2, distance: 0.5 },
            Hit { id: 1, distance: 0.1 },
        ];
        let top = stable_top_k(hits, 3);
        assert_eq!(top.iter().map(|h| h.id).collect::<Vec<_>>(), vec![1, 2, 7]);
    }

    #[test]
    fn truncates_to_k() {
        let hits = vec![
            Hit { id: 0, distance: 0.3 },
            Hit { id: 1, distance: 0.2 },
            Hit { id: 2, distance: 0.9 },
        ];
        let top = stable_top_k(hits, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].id, 1);
    }
}
