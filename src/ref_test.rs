// Reference index, counts every key in a slot of its own.
struct RefCounts {
    counts: Vec<usize>,
}

impl RefCounts {
    fn new(capacity: usize) -> RefCounts {
        RefCounts {
            counts: vec![0; capacity],
        }
    }

    fn len(&self) -> usize {
        self.counts.iter().filter(|&&count| count > 0).count()
    }

    fn get(&self, key: i64) -> Option<usize> {
        match self.counts[key as usize] {
            0 => None,
            count => Some(count),
        }
    }

    fn insert(&mut self, key: i64) -> usize {
        let count = &mut self.counts[key as usize];
        *count += 1;
        *count
    }

    // Ok(remaining occurrences) or Err(()) when key is absent.
    fn delete(&mut self, key: i64) -> Result<usize, ()> {
        let count = &mut self.counts[key as usize];
        match *count {
            0 => Err(()),
            _ => {
                *count -= 1;
                Ok(*count)
            }
        }
    }

    fn min(&self) -> Option<i64> {
        self.counts.iter().position(|&count| count > 0).map(|key| key as i64)
    }

    fn max(&self) -> Option<i64> {
        self.counts.iter().rposition(|&count| count > 0).map(|key| key as i64)
    }

    fn iter(&self) -> std::vec::IntoIter<(i64, usize)> {
        self.counts
            .iter()
            .enumerate()
            .filter_map(|(key, &count)| match count {
                0 => None,
                count => Some((key as i64, count)),
            })
            .collect::<Vec<(i64, usize)>>()
            .into_iter()
    }
}
