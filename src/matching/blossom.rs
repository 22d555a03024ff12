//! Maximum-weight matching on general graphs (Edmonds' blossom algorithm with Galil's
//! O(n³) dual bookkeeping).
//!
//! Vertices are `0..vertex_count`. Edge endpoints are numbered `2k` and `2k + 1` for
//! edge `k`, so `p ^ 1` is the opposite endpoint of `p`. Weights are integers, which
//! keeps every dual update exact.

const NIL: usize = usize::MAX;

pub type Edge = (usize, usize, i64);

/// Partner of every vertex in a maximum-weight matching (not necessarily of maximum
/// cardinality), `None` for unmatched vertices.
pub fn max_weight_matching(vertex_count: usize, edges: &[Edge]) -> Vec<Option<usize>> {
    if edges.is_empty() {
        return vec![None; vertex_count];
    }
    let n = edges
        .iter()
        .map(|&(i, j, _)| i.max(j) + 1)
        .max()
        .unwrap_or(0)
        .max(vertex_count);
    let mut mate = Matcher::new(n, edges).solve();
    mate.truncate(vertex_count);
    mate
}

/// Index into a blossom's child ring the way a negative offset wraps around.
fn ring(index: isize, len: usize) -> usize {
    index.rem_euclid(len as isize) as usize
}

struct Matcher<'a> {
    edges: &'a [Edge],
    n: usize,
    endpoint: Vec<usize>,
    neighbend: Vec<Vec<usize>>,
    mate: Vec<usize>,
    label: Vec<i8>,
    labelend: Vec<usize>,
    inblossom: Vec<usize>,
    blossomparent: Vec<usize>,
    blossomchilds: Vec<Vec<usize>>,
    blossombase: Vec<usize>,
    blossomendps: Vec<Vec<usize>>,
    bestedge: Vec<usize>,
    blossombestedges: Vec<Option<Vec<usize>>>,
    unusedblossoms: Vec<usize>,
    dualvar: Vec<i64>,
    allowedge: Vec<bool>,
    queue: Vec<usize>,
}

impl<'a> Matcher<'a> {
    fn new(n: usize, edges: &'a [Edge]) -> Matcher<'a> {
        let maxweight = edges.iter().map(|&(_, _, w)| w).max().unwrap_or(0).max(0);
        let endpoint = (0..2 * edges.len())
            .map(|p| {
                let (i, j, _) = edges[p / 2];
                if p % 2 == 0 { i } else { j }
            })
            .collect();
        let mut neighbend = vec![Vec::new(); n];
        for (k, &(i, j, _)) in edges.iter().enumerate() {
            neighbend[i].push(2 * k + 1);
            neighbend[j].push(2 * k);
        }
        let mut dualvar = vec![maxweight; n];
        dualvar.resize(2 * n, 0);
        let mut blossombase: Vec<usize> = (0..n).collect();
        blossombase.resize(2 * n, NIL);
        Matcher {
            edges,
            n,
            endpoint,
            neighbend,
            mate: vec![NIL; n],
            label: vec![0; 2 * n],
            labelend: vec![NIL; 2 * n],
            inblossom: (0..n).collect(),
            blossomparent: vec![NIL; 2 * n],
            blossomchilds: vec![Vec::new(); 2 * n],
            blossombase,
            blossomendps: vec![Vec::new(); 2 * n],
            bestedge: vec![NIL; 2 * n],
            blossombestedges: vec![None; 2 * n],
            unusedblossoms: (n..2 * n).collect(),
            dualvar,
            allowedge: vec![false; edges.len()],
            queue: Vec::new(),
        }
    }

    fn slack(&self, k: usize) -> i64 {
        let (i, j, w) = self.edges[k];
        self.dualvar[i] + self.dualvar[j] - 2 * w
    }

    fn blossom_leaves(&self, b: usize) -> Vec<usize> {
        if b < self.n {
            return vec![b];
        }
        let mut leaves = Vec::new();
        for &t in &self.blossomchilds[b] {
            if t < self.n {
                leaves.push(t);
            } else {
                leaves.extend(self.blossom_leaves(t));
            }
        }
        leaves
    }

    /// Labels the top-level blossom of `w` as S (1) or T (2), reached through endpoint `p`.
    fn assign_label(&mut self, w: usize, t: i8, p: usize) {
        let b = self.inblossom[w];
        self.label[w] = t;
        self.label[b] = t;
        self.labelend[w] = p;
        self.labelend[b] = p;
        self.bestedge[w] = NIL;
        self.bestedge[b] = NIL;
        if t == 1 {
            let leaves = self.blossom_leaves(b);
            self.queue.extend(leaves);
        } else if t == 2 {
            let base = self.blossombase[b];
            let mate = self.mate[base];
            let partner = self.endpoint[mate];
            self.assign_label(partner, 1, mate ^ 1);
        }
    }

    /// Walks back from `v` and `w` along the alternating trees. Returns the base of the new
    /// blossom, or `NIL` when the two trees are distinct (an augmenting path).
    fn scan_blossom(&mut self, mut v: usize, mut w: usize) -> usize {
        let mut path = Vec::new();
        let mut base = NIL;
        while v != NIL || w != NIL {
            let mut b = self.inblossom[v];
            if self.label[b] & 4 != 0 {
                base = self.blossombase[b];
                break;
            }
            path.push(b);
            self.label[b] = 5;
            if self.labelend[b] == NIL {
                v = NIL;
            } else {
                v = self.endpoint[self.labelend[b]];
                b = self.inblossom[v];
                v = self.endpoint[self.labelend[b]];
            }
            if w != NIL {
                std::mem::swap(&mut v, &mut w);
            }
        }
        for b in path {
            self.label[b] = 1;
        }
        base
    }

    fn add_blossom(&mut self, base: usize, k: usize) {
        let (v, w, _) = self.edges[k];
        let bb = self.inblossom[base];
        let mut bv = self.inblossom[v];
        let mut bw = self.inblossom[w];
        let b = self.unusedblossoms.pop().expect("at most n - 1 nested blossoms");
        self.blossombase[b] = base;
        self.blossomparent[b] = NIL;
        self.blossomparent[bb] = b;

        let mut path = Vec::new();
        let mut endps = Vec::new();
        while bv != bb {
            self.blossomparent[bv] = b;
            path.push(bv);
            endps.push(self.labelend[bv]);
            bv = self.inblossom[self.endpoint[self.labelend[bv]]];
        }
        path.push(bb);
        path.reverse();
        endps.reverse();
        endps.push(2 * k);
        while bw != bb {
            self.blossomparent[bw] = b;
            path.push(bw);
            endps.push(self.labelend[bw] ^ 1);
            bw = self.inblossom[self.endpoint[self.labelend[bw]]];
        }

        self.label[b] = 1;
        self.labelend[b] = self.labelend[bb];
        self.dualvar[b] = 0;
        self.blossomchilds[b] = path.clone();
        self.blossomendps[b] = endps;
        for leaf in self.blossom_leaves(b) {
            if self.label[self.inblossom[leaf]] == 2 {
                self.queue.push(leaf);
            }
            self.inblossom[leaf] = b;
        }

        let mut bestedgeto = vec![NIL; 2 * self.n];
        for &child in &path {
            let nblists: Vec<Vec<usize>> = match self.blossombestedges[child].take() {
                Some(list) => vec![list],
                None => self
                    .blossom_leaves(child)
                    .into_iter()
                    .map(|leaf| self.neighbend[leaf].iter().map(|p| p / 2).collect())
                    .collect(),
            };
            for edge in nblists.into_iter().flatten() {
                let (i, j, _) = self.edges[edge];
                let j = if self.inblossom[j] == b { i } else { j };
                let bj = self.inblossom[j];
                if bj != b
                    && self.label[bj] == 1
                    && (bestedgeto[bj] == NIL || self.slack(edge) < self.slack(bestedgeto[bj]))
                {
                    bestedgeto[bj] = edge;
                }
            }
            self.bestedge[child] = NIL;
        }
        let best: Vec<usize> = bestedgeto.into_iter().filter(|&edge| edge != NIL).collect();
        self.bestedge[b] = NIL;
        for &edge in &best {
            if self.bestedge[b] == NIL || self.slack(edge) < self.slack(self.bestedge[b]) {
                self.bestedge[b] = edge;
            }
        }
        self.blossombestedges[b] = Some(best);
    }

    fn expand_blossom(&mut self, b: usize, endstage: bool) {
        let childs = self.blossomchilds[b].clone();
        for &s in &childs {
            self.blossomparent[s] = NIL;
            if s < self.n {
                self.inblossom[s] = s;
            } else if endstage && self.dualvar[s] == 0 {
                self.expand_blossom(s, endstage);
            } else {
                for leaf in self.blossom_leaves(s) {
                    self.inblossom[leaf] = s;
                }
            }
        }

        if !endstage && self.label[b] == 2 {
            // relabel the children on the even-length path from the entry child to the base
            let len = childs.len();
            let entrychild = self.inblossom[self.endpoint[self.labelend[b] ^ 1]];
            let mut j = childs.iter().position(|&c| c == entrychild).unwrap_or(0) as isize;
            let (jstep, endptrick): (isize, usize) = if j & 1 != 0 {
                j -= len as isize;
                (1, 0)
            } else {
                (-1, 1)
            };
            let mut p = self.labelend[b];
            while j != 0 {
                let entry = self.endpoint[p ^ 1];
                self.label[entry] = 0;
                let endp = self.blossomendps[b][ring(j - endptrick as isize, len)];
                let other = self.endpoint[endp ^ endptrick ^ 1];
                self.label[other] = 0;
                self.assign_label(entry, 2, p);
                self.allowedge[endp / 2] = true;
                j += jstep;
                p = self.blossomendps[b][ring(j - endptrick as isize, len)] ^ endptrick;
                self.allowedge[p / 2] = true;
                j += jstep;
            }
            let bv = childs[ring(j, len)];
            let entry = self.endpoint[p ^ 1];
            self.label[entry] = 2;
            self.label[bv] = 2;
            self.labelend[entry] = p;
            self.labelend[bv] = p;
            self.bestedge[bv] = NIL;
            j += jstep;
            while childs[ring(j, len)] != entrychild {
                let bv = childs[ring(j, len)];
                if self.label[bv] == 1 {
                    j += jstep;
                    continue;
                }
                let reached = self.blossom_leaves(bv).into_iter().find(|&leaf| self.label[leaf] != 0);
                if let Some(leaf) = reached {
                    self.label[leaf] = 0;
                    let partner = self.endpoint[self.mate[self.blossombase[bv]]];
                    self.label[partner] = 0;
                    let end = self.labelend[leaf];
                    self.assign_label(leaf, 2, end);
                }
                j += jstep;
            }
        }

        self.label[b] = -1;
        self.labelend[b] = NIL;
        self.blossomchilds[b].clear();
        self.blossomendps[b].clear();
        self.blossombase[b] = NIL;
        self.blossombestedges[b] = None;
        self.bestedge[b] = NIL;
        self.unusedblossoms.push(b);
    }

    /// Flips matched and unmatched edges on the path through blossom `b` from vertex `v`
    /// to its base, then makes `v` the new base.
    fn augment_blossom(&mut self, b: usize, v: usize) {
        let mut t = v;
        while self.blossomparent[t] != b {
            t = self.blossomparent[t];
        }
        if t >= self.n {
            self.augment_blossom(t, v);
        }
        let len = self.blossomchilds[b].len();
        let i = self.blossomchilds[b].iter().position(|&c| c == t).unwrap_or(0);
        let mut j = i as isize;
        let (jstep, endptrick): (isize, usize) = if i & 1 != 0 {
            j -= len as isize;
            (1, 0)
        } else {
            (-1, 1)
        };
        while j != 0 {
            j += jstep;
            let t = self.blossomchilds[b][ring(j, len)];
            let p = self.blossomendps[b][ring(j - endptrick as isize, len)] ^ endptrick;
            if t >= self.n {
                self.augment_blossom(t, self.endpoint[p]);
            }
            j += jstep;
            let t = self.blossomchilds[b][ring(j, len)];
            if t >= self.n {
                self.augment_blossom(t, self.endpoint[p ^ 1]);
            }
            self.mate[self.endpoint[p]] = p ^ 1;
            self.mate[self.endpoint[p ^ 1]] = p;
        }
        self.blossomchilds[b].rotate_left(i);
        self.blossomendps[b].rotate_left(i);
        self.blossombase[b] = self.blossombase[self.blossomchilds[b][0]];
    }

    fn augment_matching(&mut self, k: usize) {
        let (v, w, _) = self.edges[k];
        for (mut s, mut p) in [(v, 2 * k + 1), (w, 2 * k)] {
            loop {
                let bs = self.inblossom[s];
                if bs >= self.n {
                    self.augment_blossom(bs, s);
                }
                self.mate[s] = p;
                if self.labelend[bs] == NIL {
                    break;
                }
                let t = self.endpoint[self.labelend[bs]];
                let bt = self.inblossom[t];
                s = self.endpoint[self.labelend[bt]];
                let j = self.endpoint[self.labelend[bt] ^ 1];
                if bt >= self.n {
                    self.augment_blossom(bt, j);
                }
                self.mate[j] = self.labelend[bt];
                p = self.labelend[bt] ^ 1;
            }
        }
    }

    /// Scans the S-vertices in the queue until an augmenting path is applied.
    fn grow_trees(&mut self) -> bool {
        while let Some(v) = self.queue.pop() {
            for index in 0..self.neighbend[v].len() {
                let p = self.neighbend[v][index];
                let k = p / 2;
                let w = self.endpoint[p];
                if self.inblossom[v] == self.inblossom[w] {
                    continue;
                }
                let mut kslack = 0;
                if !self.allowedge[k] {
                    kslack = self.slack(k);
                    if kslack <= 0 {
                        self.allowedge[k] = true;
                    }
                }
                if self.allowedge[k] {
                    if self.label[self.inblossom[w]] == 0 {
                        self.assign_label(w, 2, p ^ 1);
                    } else if self.label[self.inblossom[w]] == 1 {
                        let base = self.scan_blossom(v, w);
                        if base != NIL {
                            self.add_blossom(base, k);
                        } else {
                            self.augment_matching(k);
                            return true;
                        }
                    } else if self.label[w] == 0 {
                        self.label[w] = 2;
                        self.labelend[w] = p ^ 1;
                    }
                } else if self.label[self.inblossom[w]] == 1 {
                    let b = self.inblossom[v];
                    if self.bestedge[b] == NIL || kslack < self.slack(self.bestedge[b]) {
                        self.bestedge[b] = k;
                    }
                } else if self.label[w] == 0
                    && (self.bestedge[w] == NIL || kslack < self.slack(self.bestedge[w]))
                {
                    self.bestedge[w] = k;
                }
            }
        }
        false
    }

    /// Applies the smallest dual change that unblocks the search. Returns `false` once the
    /// optimum is reached.
    fn update_duals(&mut self) -> bool {
        let n = self.n;
        let mut deltatype = 1;
        let mut delta = self.dualvar[..n].iter().copied().min().unwrap_or(0);
        let mut deltaedge = NIL;
        let mut deltablossom = NIL;
        for v in 0..n {
            if self.label[self.inblossom[v]] == 0 && self.bestedge[v] != NIL {
                let d = self.slack(self.bestedge[v]);
                if d < delta {
                    delta = d;
                    deltatype = 2;
                    deltaedge = self.bestedge[v];
                }
            }
        }
        for b in 0..2 * n {
            if self.blossomparent[b] == NIL && self.label[b] == 1 && self.bestedge[b] != NIL {
                let d = self.slack(self.bestedge[b]) / 2;
                if d < delta {
                    delta = d;
                    deltatype = 3;
                    deltaedge = self.bestedge[b];
                }
            }
        }
        for b in n..2 * n {
            if self.blossombase[b] != NIL
                && self.blossomparent[b] == NIL
                && self.label[b] == 2
                && self.dualvar[b] < delta
            {
                delta = self.dualvar[b];
                deltatype = 4;
                deltablossom = b;
            }
        }

        for v in 0..n {
            match self.label[self.inblossom[v]] {
                1 => self.dualvar[v] -= delta,
                2 => self.dualvar[v] += delta,
                _ => {}
            }
        }
        for b in n..2 * n {
            if self.blossombase[b] != NIL && self.blossomparent[b] == NIL {
                match self.label[b] {
                    1 => self.dualvar[b] += delta,
                    2 => self.dualvar[b] -= delta,
                    _ => {}
                }
            }
        }

        match deltatype {
            2 => {
                self.allowedge[deltaedge] = true;
                let (i, j, _) = self.edges[deltaedge];
                let s = if self.label[self.inblossom[i]] == 0 { j } else { i };
                self.queue.push(s);
            }
            3 => {
                self.allowedge[deltaedge] = true;
                let (i, _, _) = self.edges[deltaedge];
                self.queue.push(i);
            }
            4 => self.expand_blossom(deltablossom, false),
            _ => return false,
        }
        true
    }

    fn solve(mut self) -> Vec<Option<usize>> {
        let n = self.n;
        for _ in 0..n {
            self.label.fill(0);
            self.bestedge.fill(NIL);
            for b in n..2 * n {
                self.blossombestedges[b] = None;
            }
            self.allowedge.fill(false);
            self.queue.clear();
            for v in 0..n {
                if self.mate[v] == NIL && self.label[self.inblossom[v]] == 0 {
                    self.assign_label(v, 1, NIL);
                }
            }

            let mut augmented = false;
            loop {
                if self.grow_trees() {
                    augmented = true;
                    break;
                }
                if !self.update_duals() {
                    break;
                }
            }
            if !augmented {
                break;
            }

            for b in n..2 * n {
                if self.blossomparent[b] == NIL
                    && self.blossombase[b] != NIL
                    && self.label[b] == 1
                    && self.dualvar[b] == 0
                {
                    self.expand_blossom(b, true);
                }
            }
        }
        self.mate
            .iter()
            .map(|&p| if p == NIL { None } else { Some(self.endpoint[p]) })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partners(vertex_count: usize, edges: &[Edge]) -> Vec<Option<usize>> {
        max_weight_matching(vertex_count, edges)
    }

    fn mates(expected: &[isize]) -> Vec<Option<usize>> {
        expected.iter().map(|&m| usize::try_from(m).ok()).collect()
    }

    #[test]
    fn empty_graph_matches_nothing() {
        assert_eq!(partners(3, &[]), vec![None, None, None]);
    }

    #[test]
    fn single_edge() {
        assert_eq!(partners(2, &[(0, 1, 1)]), vec![Some(1), Some(0)]);
    }

    #[test]
    fn prefers_heavier_edge() {
        assert_eq!(partners(4, &[(1, 2, 10), (2, 3, 11)]), mates(&[-1, -1, 3, 2]));
    }

    #[test]
    fn weight_beats_cardinality() {
        assert_eq!(partners(5, &[(1, 2, 5), (2, 3, 11), (3, 4, 5)]), mates(&[-1, -1, 3, 2, -1]));
    }

    #[test]
    fn creates_s_blossom() {
        let edges = [(1, 2, 8), (1, 3, 9), (2, 3, 10), (3, 4, 7)];
        assert_eq!(partners(5, &edges), mates(&[-1, 2, 1, 4, 3]));
        let edges = [(1, 2, 8), (1, 3, 9), (2, 3, 10), (3, 4, 7), (1, 6, 5), (4, 5, 6)];
        assert_eq!(partners(7, &edges), mates(&[-1, 6, 3, 2, 5, 4, 1]));
    }

    #[test]
    fn creates_t_blossom() {
        let edges = [(1, 2, 9), (1, 3, 8), (2, 3, 10), (1, 4, 5), (4, 5, 4), (1, 6, 3)];
        assert_eq!(partners(7, &edges), mates(&[-1, 6, 3, 2, 5, 4, 1]));
    }

    #[test]
    fn nested_s_blossom() {
        let edges = [(1, 2, 9), (1, 3, 9), (2, 3, 10), (2, 4, 8), (3, 5, 8), (4, 5, 10), (5, 6, 6)];
        assert_eq!(partners(7, &edges), mates(&[-1, 3, 4, 1, 2, 6, 5]));
    }

    #[test]
    fn relabels_nested_s_blossom() {
        let edges = [
            (1, 2, 10), (1, 7, 10), (2, 3, 12), (3, 4, 20), (3, 5, 20),
            (4, 5, 25), (5, 6, 10), (6, 7, 10), (7, 8, 8),
        ];
        assert_eq!(partners(9, &edges), mates(&[-1, 2, 1, 4, 3, 6, 5, 8, 7]));
    }

    #[test]
    fn expands_nested_s_blossom() {
        let edges = [
            (1, 2, 8), (1, 3, 8), (2, 3, 10), (2, 4, 12), (3, 5, 12),
            (4, 5, 14), (4, 6, 12), (5, 7, 12), (6, 7, 14), (7, 8, 12),
        ];
        assert_eq!(partners(9, &edges), mates(&[-1, 2, 1, 5, 6, 3, 4, 8, 7]));
    }

    #[test]
    fn expands_t_blossom_with_least_slack() {
        let edges = [
            (1, 2, 45), (1, 5, 45), (2, 3, 50), (3, 4, 45), (4, 5, 50),
            (1, 6, 30), (3, 9, 35), (4, 8, 28), (5, 7, 26), (9, 10, 5),
        ];
        assert_eq!(partners(11, &edges), mates(&[-1, 6, 3, 2, 8, 7, 1, 5, 4, 10, 9]));
    }

    #[test]
    fn expands_nested_t_blossom() {
        let edges = [
            (1, 2, 45), (1, 7, 45), (2, 3, 50), (3, 4, 45), (4, 5, 95), (4, 6, 94),
            (5, 6, 94), (6, 7, 50), (1, 8, 30), (3, 11, 35), (5, 9, 36), (7, 10, 26), (11, 12, 5),
        ];
        assert_eq!(partners(13, &edges), mates(&[-1, 8, 3, 2, 6, 9, 4, 10, 1, 5, 7, 12, 11]));
    }
}
