//! Reversible graph modifications: `Fold` and `Alternative`.
//!
//! Both kinds replace a local subgraph with a smaller proxy subgraph and
//! know how to (a) splice the original adjacency back in (`restore`, used on
//! backtrack) and (b) lift a cover found on the reduced graph back onto the
//! vertices they removed (`reverse`, used whenever a candidate solution is
//! recorded or propagated).
//!
//! Unlike the reference implementation, a `Modification` does not hold a
//! back-pointer to the solver that created it: `restore` takes `&mut Solver`
//! as a short-lived borrow instead, which sidesteps the cyclic-ownership
//! problem a back-pointer would create in Rust.

use crate::state::{Solver, UNDECIDED};

#[derive(Debug)]
pub(crate) enum Modification {
    Fold(FoldMod),
    Alternative(AltMod),
}

/// `Fold(S, NS)`: `removed` is `S` (`k` entries) followed by `NS[1..]` (`k`
/// entries); `vs[0]` is the surviving proxy, reusing the id `NS[0]`, plus
/// every external neighbour whose adjacency was rewritten.
#[derive(Debug)]
pub(crate) struct FoldMod {
    pub k: usize,
    pub removed: Vec<usize>,
    pub vs: Vec<usize>,
    pub saved_adj: Vec<(usize, Vec<usize>)>,
}

/// `Alternative(A, B)`: `removed` is `A` followed by `B` (`k` entries each).
/// `vs` is `A' = N(A)\B` (`a_len` entries) followed by `B' = N(B)\A`.
#[derive(Debug)]
pub(crate) struct AltMod {
    pub a_len: usize,
    pub removed: Vec<usize>,
    pub vs: Vec<usize>,
    pub saved_adj: Vec<(usize, Vec<usize>)>,
}

impl Modification {
    /// Projects a completed assignment `y` through this modification,
    /// deciding the vertices it had removed.
    pub fn reverse(&self, y: &mut [i8]) {
        match self {
            Modification::Fold(f) => {
                let proxy = f.vs[0];
                let (cover_side, is_side) = f.removed.split_at(f.k);
                if y[proxy] == 1 {
                    for &v in is_side {
                        y[v] = 1;
                    }
                    for &v in cover_side {
                        y[v] = 0;
                    }
                } else {
                    for &v in cover_side {
                        y[v] = 1;
                    }
                    for &v in is_side {
                        y[v] = 0;
                    }
                }
            }
            Modification::Alternative(a) => {
                let k = a.removed.len() / 2;
                let (a_side, b_side) = a.removed.split_at(k);
                let a_prime_in_cover = a.vs[..a.a_len].iter().any(|&v| y[v] == 1);
                if !a_prime_in_cover {
                    for &v in a_side {
                        y[v] = 0;
                    }
                    for &v in b_side {
                        y[v] = 1;
                    }
                } else {
                    for &v in a_side {
                        y[v] = 1;
                    }
                    for &v in b_side {
                        y[v] = 0;
                    }
                }
            }
        }
    }

    /// Undoes this modification in place on `solver`: splices saved
    /// adjacency back, marks `removed` undecided again and grows `rn` by
    /// `removed.len()`.
    pub fn restore(self, solver: &mut Solver) {
        let (saved_adj, removed) = match self {
            Modification::Fold(f) => (f.saved_adj, f.removed),
            Modification::Alternative(a) => (a.saved_adj, a.removed),
        };
        for (v, old) in saved_adj {
            solver.adj[v] = old;
        }
        for &v in &removed {
            solver.x[v] = UNDECIDED;
        }
        solver.rn += removed.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_reverse_proxy_in_cover_puts_ns_in_cover() {
        let m = Modification::Fold(FoldMod {
            k: 1,
            removed: vec![0, 2], // S = {0}, NS[1..] = {2}
            vs: vec![1],         // proxy reuses NS[0] = 1
            saved_adj: Vec::new(),
        });
        let mut y = vec![-1i8; 3];
        y[1] = 1;
        m.reverse(&mut y);
        assert_eq!(y, vec![0, 1, 1]);
    }

    #[test]
    fn fold_reverse_proxy_out_puts_s_in_cover() {
        let m = Modification::Fold(FoldMod {
            k: 1,
            removed: vec![0, 2],
            vs: vec![1],
            saved_adj: Vec::new(),
        });
        let mut y = vec![-1i8; 3];
        y[1] = 0;
        m.reverse(&mut y);
        assert_eq!(y, vec![1, 0, 0]);
    }

    #[test]
    fn alternative_reverse_swaps_on_a_prime_in_cover() {
        let m = Modification::Alternative(AltMod {
            a_len: 1,
            removed: vec![0, 1], // A = {0}, B = {1}
            vs: vec![2, 3],      // A' = {2}, B' = {3}
            saved_adj: Vec::new(),
        });
        let mut y = vec![-1i8; 4];
        y[2] = 0; // A' not in cover -> A into IS, B into cover
        m.reverse(&mut y);
        assert_eq!(y[0], 0);
        assert_eq!(y[1], 1);

        let mut y2 = vec![-1i8; 4];
        y2[2] = 1; // A' in cover -> swap
        m.reverse(&mut y2);
        assert_eq!(y2[0], 1);
        assert_eq!(y2[1], 0);
    }
}
