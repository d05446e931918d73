//! Binary world-frame codec.
//!
//! Broadcast frames carry a [`WorldData`] encoded with bincode: fields
//! in declaration order, self-delimited, decoded by position. The
//! round-trip is bit-exact for every legal snapshot, which the property
//! test below pins down.

use silt_core::{ProtocolError, WorldData};

/// Encode a snapshot into a broadcast frame.
pub fn encode_world(data: &WorldData) -> Result<Vec<u8>, ProtocolError> {
    bincode::serialize(data).map_err(|e| ProtocolError::Frame(e.to_string()))
}

/// Decode a broadcast frame back into a snapshot.
pub fn decode_world(bytes: &[u8]) -> Result<WorldData, ProtocolError> {
    bincode::deserialize(bytes).map_err(|e| ProtocolError::Frame(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use silt_core::{
        Cell, Material, SandboxConfig, ScenarioConfig, TickId, Vec2,
    };

    fn sample_world() -> WorldData {
        let mut data = WorldData::new(6, 4);
        data.timestep = TickId(123);
        data.scenario_id = "sandbox".to_string();
        data.scenario_config = ScenarioConfig::Sandbox(SandboxConfig::default());
        data.selected_material = Material::Water;
        data.fps_server = 59.7;
        *data.cell_mut(2, 1).unwrap() = Cell {
            material: Material::Water,
            fill_ratio: 0.5,
            com: Vec2::new(0.1, -0.2),
            velocity: Vec2::new(0.0, 1.5),
            pressure: 3.25,
        };
        *data.cell_mut(0, 3).unwrap() = Cell::full(Material::Wall);
        data.recompute_total_mass();
        data
    }

    #[test]
    fn round_trip_is_bit_exact() {
        let world = sample_world();
        let bytes = encode_world(&world).unwrap();
        let back = decode_world(&bytes).unwrap();
        assert_eq!(back, world);
    }

    #[test]
    fn truncated_frame_is_rejected() {
        let bytes = encode_world(&sample_world()).unwrap();
        let err = decode_world(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, ProtocolError::Frame(_)));
    }

    #[test]
    fn empty_frame_is_rejected() {
        assert!(decode_world(&[]).is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_material() -> impl Strategy<Value = Material> {
            prop_oneof![
                Just(Material::Air),
                Just(Material::Dirt),
                Just(Material::Water),
                Just(Material::Wood),
                Just(Material::Sand),
                Just(Material::Metal),
                Just(Material::Leaf),
                Just(Material::Wall),
                Just(Material::Seed),
            ]
        }

        fn arb_cell() -> impl Strategy<Value = Cell> {
            (
                arb_material(),
                0.0f64..=1.0,
                -1.0f64..=1.0,
                -1.0f64..=1.0,
                -10.0f64..=10.0,
                -10.0f64..=10.0,
                0.0f64..=100.0,
            )
                .prop_map(|(material, fill, cx, cy, vx, vy, pressure)| Cell {
                    material,
                    fill_ratio: fill,
                    com: Vec2::new(cx, cy),
                    velocity: Vec2::new(vx, vy),
                    pressure,
                })
        }

        proptest! {
            #[test]
            fn any_grid_round_trips(
                width in 1u32..8,
                height in 1u32..8,
                seed_cells in prop::collection::vec(arb_cell(), 64),
            ) {
                let mut data = WorldData::new(width, height);
                let n = data.cells.len();
                data.cells.copy_from_slice(&seed_cells[..n]);
                data.recompute_total_mass();

                let bytes = encode_world(&data).unwrap();
                let back = decode_world(&bytes).unwrap();
                prop_assert_eq!(back, data);
            }
        }
    }
}
