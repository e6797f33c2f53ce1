//! Pass, slice and lane ordering, and the choice of reference blocks.

use crate::arena::{Arena, ArenaView};
use crate::block::{Block, QWORDS_IN_BLOCK};
use crate::params::{Algorithm, Geometry, SYNC_POINTS};

use rayon::ThreadPool;
use zeroize::Zeroize;

/// Location of a block within the schedule. `index` counts from the start of the segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Position {
    pub(crate) pass: u32,
    pub(crate) lane: u32,
    pub(crate) slice: u32,
    pub(crate) index: u32,
}

/// Maps the pseudo-random value of the block at `position` to the `(lane, index_in_lane)` of
/// its reference block.
///
/// The low 32 bits pick a position with a bias towards recent blocks; the high 32 bits pick
/// the lane. In the first slice of the first pass a block can only reference its own lane.
/// The candidate area never contains the current block, blocks of the current slice in other
/// lanes, or (for other lanes) the block being written concurrently at the same position.
pub(crate) fn reference_block(
    geometry: &Geometry,
    position: Position,
    pseudo_rand: u64,
) -> (u32, u32) {
    let Position {
        pass,
        lane,
        slice,
        index,
    } = position;

    let ref_lane = if pass == 0 && slice == 0 {
        lane
    } else {
        ((pseudo_rand >> 32) % u64::from(geometry.lanes)) as u32
    };
    let same_lane = ref_lane == lane;

    let segment_length = u64::from(geometry.segment_length);
    let index = u64::from(index);
    let finished = if pass == 0 {
        u64::from(slice) * segment_length
    } else {
        u64::from(geometry.lane_length) - segment_length
    };

    let reference_area_size = if same_lane {
        finished + index - 1
    } else if index == 0 {
        finished - 1
    } else {
        finished
    };

    let j1 = pseudo_rand & 0xffff_ffff;
    let x = (j1 * j1) >> 32;
    let y = (reference_area_size * x) >> 32;
    let relative_position = reference_area_size - 1 - y;

    let start_position = if pass == 0 || slice == SYNC_POINTS - 1 {
        0
    } else {
        u64::from(slice + 1) * segment_length
    };

    let ref_index = (start_position + relative_position) % u64::from(geometry.lane_length);

    (ref_lane, ref_index as u32)
}

/// Produces the pseudo-random values for data-independent addressing, 128 at a time.
struct AddressGenerator {
    input: Block,
    addresses: Block,
}

impl AddressGenerator {
    fn new(geometry: &Geometry, algorithm: Algorithm, pass: u32, lane: u32, slice: u32) -> Self {
        let mut input = Block::ZERO;
        input.set_word(0, u64::from(pass));
        input.set_word(1, u64::from(lane));
        input.set_word(2, u64::from(slice));
        input.set_word(3, u64::from(geometry.memory_blocks));
        input.set_word(4, u64::from(geometry.passes));
        input.set_word(5, u64::from(algorithm.type_code()));

        Self {
            input,
            addresses: Block::ZERO,
        }
    }

    fn refill(&mut self) {
        self.input.set_word(6, self.input.word(6) + 1);

        let mut tmp = Block::ZERO;
        Block::compress(&Block::ZERO, &self.input, &mut tmp, false);
        Block::compress(&Block::ZERO, &tmp, &mut self.addresses, false);
        tmp.zeroize();
    }

    fn address(&self, index: u32) -> u64 {
        self.addresses.word(index as usize % QWORDS_IN_BLOCK)
    }
}

impl Drop for AddressGenerator {
    fn drop(&mut self) {
        self.input.zeroize();
        self.addresses.zeroize();
    }
}

/// Computes one lane's segment of one slice, in order.
fn fill_segment(
    view: ArenaView<'_>,
    geometry: &Geometry,
    algorithm: Algorithm,
    pass: u32,
    lane: u32,
    slice: u32,
) {
    let mut addresses = if algorithm.is_data_independent(pass, slice) {
        let generator = AddressGenerator::new(geometry, algorithm, pass, lane, slice);
        Some(generator)
    } else {
        None
    };

    // The first two blocks of every lane are seeded during initialization
    let starting_index = if pass == 0 && slice == 0 { 2 } else { 0 };

    if starting_index == 2 {
        if let Some(generator) = addresses.as_mut() {
            generator.refill();
        }
    }

    let lane_start = view.offset(lane, 0);
    let lane_length = geometry.lane_length as usize;

    for index in starting_index..geometry.segment_length {
        let index_in_lane = slice * geometry.segment_length + index;
        let current = lane_start + index_in_lane as usize;
        let previous = if index_in_lane == 0 {
            lane_start + lane_length - 1
        } else {
            current - 1
        };

        // SAFETY: `previous` is in this lane and outside the current write position.
        let prev_block = unsafe { view.block(previous) };

        let pseudo_rand = match addresses.as_mut() {
            Some(generator) => {
                if index as usize % QWORDS_IN_BLOCK == 0 {
                    generator.refill();
                }
                generator.address(index)
            }
            None => prev_block.word(0),
        };

        let position = Position {
            pass,
            lane,
            slice,
            index,
        };
        let (ref_lane, ref_index) = reference_block(geometry, position, pseudo_rand);

        // SAFETY: the reference area excludes the current block and every block another lane
        // writes during this slice; `current` belongs to this lane's segment only.
        let (ref_block, next_block) = unsafe {
            (
                view.block(view.offset(ref_lane, ref_index)),
                view.block_mut(current),
            )
        };

        Block::compress(prev_block, ref_block, next_block, pass > 0);
    }
}

/// Runs every pass over the arena.
///
/// Slices are processed one after another; within a slice the lanes are independent and run
/// on `pool` when one is given. The pool's scope returning is the slice barrier.
pub(crate) fn fill_memory(
    arena: &mut Arena,
    geometry: &Geometry,
    algorithm: Algorithm,
    pool: Option<&ThreadPool>,
) {
    for pass in 0..geometry.passes {
        for slice in 0..SYNC_POINTS {
            let view = arena.view();

            match pool {
                Some(pool) if geometry.lanes > 1 => pool.scope(|scope| {
                    for lane in 0..geometry.lanes {
                        scope.spawn(move |_| {
                            fill_segment(view, geometry, algorithm, pass, lane, slice);
                        });
                    }
                }),
                _ => {
                    for lane in 0..geometry.lanes {
                        fill_segment(view, geometry, algorithm, pass, lane, slice);
                    }
                }
            }
        }

        tracing::trace!(pass, "pass complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Params;

    fn geometry(m_cost: u32, lanes: u32) -> Geometry {
        Params::new(2, m_cost, lanes, 32).unwrap().geometry()
    }

    fn at(pass: u32, lane: u32, slice: u32, index: u32) -> Position {
        Position {
            pass,
            lane,
            slice,
            index,
        }
    }

    #[test]
    fn test_first_slice_stays_in_lane() {
        let g = geometry(32, 2);
        assert_eq!(
            reference_block(&g, at(0, 1, 0, 2), 0xdead_beef_cafe_f00d),
            (1, 0)
        );
    }

    #[test]
    fn test_known_reference_indices() {
        let g = geometry(32, 2);

        assert_eq!(reference_block(&g, at(1, 0, 1, 0), 1 << 32), (1, 2));
        assert_eq!(reference_block(&g, at(1, 0, 3, 3), 0xffff_ffff), (0, 0));
        assert_eq!(
            reference_block(&g, at(0, 0, 2, 1), (3 << 32) | 0x8000_0000),
            (1, 5)
        );
        assert_eq!(
            reference_block(&g, at(1, 1, 0, 2), (4 << 32) | 0x1234_5678),
            (0, 15)
        );
    }

    #[test]
    fn test_references_point_at_finished_blocks() {
        let g = geometry(64, 4);
        let samples = [0u64, 1, 0x8000_0000, 0xffff_ffff, 0x89ab_cdef, u64::MAX];

        for pass in 0..2 {
            for slice in 0..SYNC_POINTS {
                for lane in 0..g.lanes {
                    let start = if pass == 0 && slice == 0 { 2 } else { 0 };
                    for index in start..g.segment_length {
                        let current = slice * g.segment_length + index;
                        for (n, low) in samples.iter().enumerate() {
                            let pseudo_rand = ((n as u64) << 32) | (low & 0xffff_ffff);
                            let (ref_lane, ref_index) =
                                reference_block(&g, at(pass, lane, slice, index), pseudo_rand);

                            assert!(ref_lane < g.lanes);
                            assert!(ref_index < g.lane_length);

                            let in_current_slice = ref_index / g.segment_length == slice;
                            if ref_lane == lane {
                                let previous = (current + g.lane_length - 1) % g.lane_length;
                                assert_ne!(ref_index, current);
                                assert_ne!(ref_index, previous);
                                if pass == 0 {
                                    assert!(ref_index < current);
                                }
                            } else {
                                assert!(!in_current_slice);
                                if pass == 0 {
                                    assert!(ref_index < slice * g.segment_length);
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_parallel_schedule_matches_sequential() {
        let params = Params::new(2, 64, 4, 32).unwrap();
        let g = params.geometry();

        let seed = |arena: &mut Arena| {
            for lane in 0..g.lanes {
                for index in 0..2 {
                    let block = arena.block_mut(lane, index);
                    for word in 0..QWORDS_IN_BLOCK {
                        let value = u64::from(lane * 7 + index * 3) + word as u64;
                        block.set_word(word, value);
                    }
                }
            }
        };

        let mut sequential = Arena::allocate(&g).unwrap();
        seed(&mut sequential);
        fill_memory(&mut sequential, &g, Algorithm::Argon2d, None);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(4)
            .build()
            .unwrap();
        let mut parallel = Arena::allocate(&g).unwrap();
        seed(&mut parallel);
        fill_memory(&mut parallel, &g, Algorithm::Argon2d, Some(&pool));

        for (a, b) in sequential.blocks().iter().zip(parallel.blocks()) {
            assert!((0..QWORDS_IN_BLOCK).all(|i| a.word(i) == b.word(i)));
        }
    }

    #[test]
    fn test_address_generator_counts_from_one() {
        let g = geometry(32, 1);
        let mut first = AddressGenerator::new(&g, Algorithm::Argon2i, 0, 0, 0);
        let mut second = AddressGenerator::new(&g, Algorithm::Argon2i, 0, 0, 0);

        first.refill();
        second.refill();
        assert_eq!(first.address(5), second.address(5));
        assert_eq!(first.input.word(6), 1);

        second.refill();
        assert_ne!(first.address(5), second.address(5));
    }
}
