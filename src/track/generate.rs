//! Track generators. Each one turns a handful of shape parameters into a [Track].

use super::{Track, TrackGenerator};
use crate::{
    constants::{GYMKHANA_TRACK_CHECKPOINTS, GYMKHANA_TRACK_RADIUS},
    random::WyRng,
    vector::{deg_to_rad, Vector2},
};
use rand::{seq::IndexedRandom, Rng};
use serde::{Deserialize, Serialize};

/// `checkpoints` points evenly spaced counter-clockwise on a circle, starting on the x axis
#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    pub checkpoints: usize,
    pub radius: f64,
}

impl Default for Circle {
    fn default() -> Self {
        Self {
            checkpoints: GYMKHANA_TRACK_CHECKPOINTS,
            radius: GYMKHANA_TRACK_RADIUS,
        }
    }
}

impl TrackGenerator for Circle {
    fn generate(&self) -> Track {
        let step = 360. / self.checkpoints as f64;
        Track {
            checkpoints: (0..self.checkpoints)
                .map(|i| Vector2::new(self.radius, 0.).rotated(step * i as f64))
                .collect(),
            start_checkpoint_index: 0,
        }
    }
}

/// A circle whose radius swells and shrinks `waves` times per lap
#[derive(Debug, Clone, PartialEq)]
pub struct SineLoop {
    pub checkpoints: usize,
    pub radius: f64,
    pub amplitude: f64,
    pub waves: u32,
}

impl Default for SineLoop {
    fn default() -> Self {
        Self {
            checkpoints: 48,
            radius: 250.,
            amplitude: 50.,
            waves: 4,
        }
    }
}

impl TrackGenerator for SineLoop {
    fn generate(&self) -> Track {
        let step = 360. / self.checkpoints as f64;
        Track {
            checkpoints: (0..self.checkpoints)
                .map(|i| {
                    let theta = step * i as f64;
                    let r = self.radius
                        + self.amplitude
                            * (deg_to_rad(theta) * self.waves as f64).sin();
                    Vector2::new(r, 0.).rotated(theta)
                })
                .collect(),
            start_checkpoint_index: 0,
        }
    }
}

/// One piece of a [Park] layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    Straight { length: f64 },
    /// Positive `degrees` turn left
    Arc { radius: f64, degrees: f64 },
}

/// A track laid out turtle-style from straights and arcs, with a checkpoint every
/// `spacing` units of path length. The result is centred on the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Park {
    pub segments: Vec<Segment>,
    pub spacing: f64,
}

impl Default for Park {
    fn default() -> Self {
        use Segment::*;
        let chicane = [
            Straight { length: 150. },
            Arc { radius: 60., degrees: 45. },
            Arc { radius: 60., degrees: -45. },
            Straight { length: 150. },
        ];
        let hairpin = [
            Arc { radius: 80., degrees: 90. },
            Straight { length: 200. },
            Arc { radius: 80., degrees: 90. },
        ];
        Self {
            segments: chicane
                .iter()
                .chain(&hairpin)
                .chain(&chicane)
                .chain(&hairpin)
                .copied()
                .collect(),
            spacing: 45.,
        }
    }
}

impl Park {
    /// Points along the path, one per unit of length
    fn trace(&self) -> Vec<Vector2> {
        let mut pos = Vector2::ZERO;
        let mut heading = 0.;
        let mut path = vec![pos];

        for segment in &self.segments {
            match *segment {
                Segment::Straight { length } => {
                    let steps = length.round() as usize;
                    for _ in 0..steps {
                        pos += Vector2::new(length / steps as f64, 0.).rotated(heading);
                        path.push(pos);
                    }
                }
                Segment::Arc { radius, degrees } => {
                    let steps = (radius * deg_to_rad(degrees.abs())).round() as usize;
                    let turn = degrees / steps.max(1) as f64;
                    let side = if degrees >= 0. { 90. } else { -90. };
                    let centre = pos + Vector2::new(radius, 0.).rotated(heading + side);
                    let mut arm = pos - centre;
                    for _ in 0..steps {
                        arm.rotate(turn);
                        heading += turn;
                        pos = centre + arm;
                        path.push(pos);
                    }
                }
            }
        }
        path
    }
}

impl TrackGenerator for Park {
    fn generate(&self) -> Track {
        let path = self.trace();
        let mut checkpoints = vec![path[0]];
        let mut travelled = 0.;
        for pair in path.windows(2) {
            travelled += pair[0].dist(pair[1]);
            if travelled >= self.spacing {
                checkpoints.push(pair[1]);
                travelled = 0.;
            }
        }
        // the path closes on itself; a last checkpoint on top of the first is redundant
        if checkpoints.len() > 1
            && checkpoints[checkpoints.len() - 1].dist(checkpoints[0]) < self.spacing / 2.
        {
            checkpoints.pop();
        }

        let centroid = checkpoints.iter().fold(Vector2::ZERO, |acc, &cp| acc + cp)
            / checkpoints.len() as f64;
        Track {
            checkpoints: checkpoints.into_iter().map(|cp| cp - centroid).collect(),
            start_checkpoint_index: 0,
        }
    }
}

/// A random loop on a grid of square tiles.
///
/// A random spanning tree is grown over a `cols` × `rows` grid, and the track follows the
/// wall of that maze around, visiting every cell of the doubled grid exactly once. The same
/// `seed` always gives the same track.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLoop {
    pub cols: usize,
    pub rows: usize,
    pub tile: f64,
    pub seed: u64,
}

impl Default for TileLoop {
    fn default() -> Self {
        Self {
            cols: 4,
            rows: 3,
            tile: 60.,
            seed: 0,
        }
    }
}

impl TileLoop {
    /// Open passages of the spanning tree, as (east, south) per coarse cell
    fn maze(&self, rng: &mut WyRng) -> (Vec<bool>, Vec<bool>) {
        let (cols, rows) = (self.cols, self.rows);
        let mut east = vec![false; cols * rows];
        let mut south = vec![false; cols * rows];
        let mut visited = vec![false; cols * rows];
        let mut stack = vec![rng.random_range(0..cols * rows)];
        visited[stack[0]] = true;

        while let Some(&cell) = stack.last() {
            let (x, y) = (cell % cols, cell / cols);
            // (neighbour, cell owning the wall, wall is east rather than south)
            let mut next = Vec::with_capacity(4);
            if x > 0 && !visited[cell - 1] {
                next.push((cell - 1, cell - 1, true));
            }
            if x + 1 < cols && !visited[cell + 1] {
                next.push((cell + 1, cell, true));
            }
            if y > 0 && !visited[cell - cols] {
                next.push((cell - cols, cell - cols, false));
            }
            if y + 1 < rows && !visited[cell + cols] {
                next.push((cell + cols, cell, false));
            }

            let Some(&(to, owner, is_east)) = next.choose(rng) else {
                stack.pop();
                continue;
            };
            if is_east {
                east[owner] = true;
            } else {
                south[owner] = true;
            }
            visited[to] = true;
            stack.push(to);
        }
        (east, south)
    }
}

impl TrackGenerator for TileLoop {
    fn generate(&self) -> Track {
        assert!(
            self.cols > 0 && self.rows > 0,
            "tile grid must not be empty, got {}x{}",
            self.cols,
            self.rows
        );

        let mut rng = WyRng::seeded(self.seed);
        let (east, south) = self.maze(&mut rng);
        let (cols, rows) = (self.cols, self.rows);
        let width = 2 * cols;
        let fine = |x: usize, y: usize| y * width + x;

        let mut links = vec![Vec::with_capacity(2); 4 * cols * rows];
        let mut link = |a: usize, b: usize| {
            links[a].push(b);
            links[b].push(a);
        };
        for y in 0..rows {
            for x in 0..cols {
                let cell = y * cols + x;
                let north = y > 0 && south[cell - cols];
                let west = x > 0 && east[cell - 1];
                let (tl, tr) = (fine(2 * x, 2 * y), fine(2 * x + 1, 2 * y));
                let (bl, br) = (fine(2 * x, 2 * y + 1), fine(2 * x + 1, 2 * y + 1));

                if !north {
                    link(tl, tr);
                }
                if !south[cell] {
                    link(bl, br);
                }
                if !west {
                    link(tl, bl);
                }
                if !east[cell] {
                    link(tr, br);
                } else {
                    link(tr, fine(2 * x + 2, 2 * y));
                    link(br, fine(2 * x + 2, 2 * y + 1));
                }
                if south[cell] {
                    link(bl, fine(2 * x, 2 * y + 2));
                    link(br, fine(2 * x + 1, 2 * y + 2));
                }
            }
        }

        // every fine cell now has exactly two links, and they form a single cycle
        let mut order = Vec::with_capacity(links.len());
        let (mut prev, mut at) = (usize::MAX, 0);
        loop {
            order.push(at);
            let next = if links[at][0] != prev {
                links[at][0]
            } else {
                links[at][1]
            };
            (prev, at) = (at, next);
            if at == 0 {
                break;
            }
        }

        let offset = Vector2::new(width as f64, 2. * rows as f64) * (self.tile / 2.);
        Track {
            checkpoints: order
                .into_iter()
                .map(|i| {
                    Vector2::new((i % width) as f64 + 0.5, (i / width) as f64 + 0.5) * self.tile
                        - offset
                })
                .collect(),
            start_checkpoint_index: 0,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{assert_f64_approx, test_t};

    test_t!(
    generator_contract[T: Circle | SineLoop | Park | TileLoop]() {
        let track = T::default().generate();
        track.validate();
        assert!(track.checkpoints.len() >= 3);
        assert!(track.checkpoints.iter().all(Vector2::is_finite));
        for pair in track.checkpoints.windows(2) {
            assert!(pair[0].dist(pair[1]) > 1., "{pair:?}");
        }
    });

    test_t!(
    generator_is_deterministic[T: Circle | SineLoop | Park | TileLoop]() {
        assert_eq!(T::default().generate(), T::default().generate());
    });

    #[test]
    fn test_circle_layout() {
        let track = Circle::default().generate();
        assert_eq!(track.checkpoints.len(), 36);
        assert_f64_approx!(track.checkpoints[0].x, 200.);
        assert_f64_approx!(track.checkpoints[9].y, 200.);
        assert_f64_approx!(track.checkpoints[35].heading(), -10.);
    }

    #[test]
    fn test_sine_radius_bounds() {
        let sine = SineLoop::default();
        for cp in sine.generate().checkpoints {
            assert!(cp.mag() <= sine.radius + sine.amplitude + 1e-9);
            assert!(cp.mag() >= sine.radius - sine.amplitude - 1e-9);
        }
    }

    #[test]
    fn test_park_closes() {
        let park = Park::default();
        let path = park.trace();
        assert!(path[0].dist(path[path.len() - 1]) < 1., "{:?}", path[path.len() - 1]);

        let track = park.generate();
        let n = track.checkpoints.len();
        assert!(track.checkpoints[n - 1].dist(track.checkpoints[0]) < park.spacing * 2.);
    }

    #[test]
    fn test_tile_loop_visits_every_cell() {
        for seed in 0..20 {
            let tiles = TileLoop {
                seed,
                ..TileLoop::default()
            };
            let track = tiles.generate();
            assert_eq!(track.checkpoints.len(), 4 * tiles.cols * tiles.rows);

            let mut seen = track.checkpoints.clone();
            seen.sort_by(|l, r| l.x.total_cmp(&r.x).then(l.y.total_cmp(&r.y)));
            seen.dedup();
            assert_eq!(seen.len(), track.checkpoints.len());

            let n = track.checkpoints.len();
            for i in 0..n {
                let step = track.checkpoints[i].dist(track.checkpoints[(i + 1) % n]);
                assert_f64_approx!(step, tiles.tile, 1e-6);
            }
        }
    }

    #[test]
    fn test_tile_loop_layouts() {
        // a 2x2 maze is a 4-cycle missing one passage, so only four loops exist
        let layouts = [
            // no passage between the top cells
            [
                (-1.5, -1.5), (-0.5, -1.5), (-0.5, -0.5), (-0.5, 0.5),
                (0.5, 0.5), (0.5, -0.5), (0.5, -1.5), (1.5, -1.5),
                (1.5, -0.5), (1.5, 0.5), (1.5, 1.5), (0.5, 1.5),
                (-0.5, 1.5), (-1.5, 1.5), (-1.5, 0.5), (-1.5, -0.5),
            ],
            // bottom cells
            [
                (-1.5, -1.5), (-0.5, -1.5), (0.5, -1.5), (1.5, -1.5),
                (1.5, -0.5), (1.5, 0.5), (1.5, 1.5), (0.5, 1.5),
                (0.5, 0.5), (0.5, -0.5), (-0.5, -0.5), (-0.5, 0.5),
                (-0.5, 1.5), (-1.5, 1.5), (-1.5, 0.5), (-1.5, -0.5),
            ],
            // left cells
            [
                (-1.5, -1.5), (-0.5, -1.5), (0.5, -1.5), (1.5, -1.5),
                (1.5, -0.5), (1.5, 0.5), (1.5, 1.5), (0.5, 1.5),
                (-0.5, 1.5), (-1.5, 1.5), (-1.5, 0.5), (-0.5, 0.5),
                (0.5, 0.5), (0.5, -0.5), (-0.5, -0.5), (-1.5, -0.5),
            ],
            // right cells
            [
                (-1.5, -1.5), (-0.5, -1.5), (0.5, -1.5), (1.5, -1.5),
                (1.5, -0.5), (0.5, -0.5), (-0.5, -0.5), (-0.5, 0.5),
                (0.5, 0.5), (1.5, 0.5), (1.5, 1.5), (0.5, 1.5),
                (-0.5, 1.5), (-1.5, 1.5), (-1.5, 0.5), (-1.5, -0.5),
            ],
        ]
        .map(|layout| layout.map(|(x, y)| Vector2::new(x, y)).to_vec());

        let mut seen = [false; 4];
        for seed in 0..64 {
            let track = TileLoop {
                cols: 2,
                rows: 2,
                tile: 1.,
                seed,
            }
            .generate();
            let Some(i) = layouts.iter().position(|l| *l == track.checkpoints) else {
                panic!("seed {seed} gave an impossible loop: {:?}", track.checkpoints);
            };
            seen[i] = true;
        }
        assert_eq!(seen, [true; 4]);
    }
}
