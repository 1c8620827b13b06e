/// An ordered list of index transpositions applied to the identity
/// permutation of `size` elements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SwapSequence {
    size: usize,
    swaps: Vec<(usize, usize)>,
}

impl SwapSequence {
    pub fn new(size: usize) -> Self {
        SwapSequence {
            size,
            swaps: Vec::new(),
        }
    }

    /// Build from `[from, to]` pairs, rejecting indices outside `0..size`.
    pub fn from_pairs(size: usize, pairs: &[[usize; 2]]) -> Result<Self, String> {
        let mut seq = SwapSequence::new(size);
        for &[from, to] in pairs {
            seq.push(from, to)?;
        }
        Ok(seq)
    }

    pub fn push(&mut self, from: usize, to: usize) -> Result<(), String> {
        if from >= self.size || to >= self.size {
            return Err(format!(
                "swap ({from}, {to}) out of range for {} elements",
                self.size
            ));
        }
        self.swaps.push((from, to));
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.swaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.swaps.is_empty()
    }

    pub fn swaps(&self) -> &[(usize, usize)] {
        &self.swaps
    }

    /// The permutation after the first `steps` swaps (saturating).
    pub fn permutation(&self, steps: usize) -> Vec<usize> {
        let mut perm: Vec<usize> = (0..self.size).collect();
        for &(from, to) in self.swaps.iter().take(steps) {
            perm.swap(from, to);
        }
        perm
    }

    /// Every intermediate permutation, identity first: `len() + 1` frames.
    pub fn frames(&self) -> Vec<Vec<usize>> {
        let mut frames = Vec::with_capacity(self.swaps.len() + 1);
        let mut perm: Vec<usize> = (0..self.size).collect();
        frames.push(perm.clone());
        for &(from, to) in &self.swaps {
            perm.swap(from, to);
            frames.push(perm.clone());
        }
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_replay_each_swap() {
        let seq = SwapSequence::from_pairs(4, &[[0, 3], [1, 2]]).unwrap();
        let frames = seq.frames();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0], vec![0, 1, 2, 3]);
        assert_eq!(frames[1], vec![3, 1, 2, 0]);
        assert_eq!(frames[2], vec![3, 2, 1, 0]);
        assert_eq!(seq.permutation(1), frames[1]);
        assert_eq!(seq.permutation(99), frames[2]);
    }

    #[test]
    fn out_of_range_swap_is_rejected() {
        assert!(SwapSequence::from_pairs(16, &[[3, 16]]).is_err());
    }
}
