use burn::tensor::Tensor;
use burn_ndarray::NdArray;
use proptest::prelude::*;
use volfuse_core::spatial::{Direction, Point, Spacing};
use volfuse_core::Volume;

type Backend = NdArray<f32>;

fn make_rotation(angle_x: f64, angle_y: f64, angle_z: f64) -> Direction<3> {
    let (sx, cx) = angle_x.sin_cos();
    let (sy, cy) = angle_y.sin_cos();
    let (sz, cz) = angle_z.sin_cos();

    let rz = nalgebra::Matrix3::new(cz, -sz, 0.0, sz, cz, 0.0, 0.0, 0.0, 1.0);
    let ry = nalgebra::Matrix3::new(cy, 0.0, sy, 0.0, 1.0, 0.0, -sy, 0.0, cy);
    let rx = nalgebra::Matrix3::new(1.0, 0.0, 0.0, 0.0, cx, -sx, 0.0, sx, cx);

    Direction(rx * ry * rz)
}

proptest! {
    #[test]
    fn test_coordinate_roundtrip(
        ox in -100.0f64..100.0, oy in -100.0f64..100.0, oz in -100.0f64..100.0,
        sx in 0.1f64..5.0, sy in 0.1f64..5.0, sz in 0.1f64..5.0,
        ax in -3.14f64..3.14, ay in -3.14f64..3.14, az in -3.14f64..3.14,
        px in -50.0f64..50.0, py in -50.0f64..50.0, pz in -50.0f64..50.0
    ) {
        let device = Default::default();
        let data = Tensor::<Backend, 3>::zeros([2, 2, 2], &device);

        let volume = Volume::new(
            data,
            Point::new([ox, oy, oz]),
            Spacing::new([sx, sy, sz]),
            make_rotation(ax, ay, az),
        );
        let point = Point::<3>::new([px, py, pz]);

        let index = volume.geometry().physical_to_continuous_index(&point);
        let recovered = volume.geometry().continuous_index_to_physical(&index);

        for axis in 0..3 {
            prop_assert!(
                (point[axis] - recovered[axis]).abs() < 1e-6,
                "axis {} mismatch: {} vs {}", axis, point[axis], recovered[axis]
            );
        }
    }

    #[test]
    fn test_tensor_path_matches_scalar_path(
        ox in -10.0f64..10.0, oy in -10.0f64..10.0, oz in -10.0f64..10.0,
        sx in 0.5f64..2.0, sy in 0.5f64..2.0, sz in 0.5f64..2.0,
        ax in -1.5f64..1.5,
        px in -10.0f64..10.0, py in -10.0f64..10.0, pz in -10.0f64..10.0
    ) {
        let device = Default::default();
        let volume = Volume::new(
            Tensor::<Backend, 3>::zeros([2, 2, 2], &device),
            Point::new([ox, oy, oz]),
            Spacing::new([sx, sy, sz]),
            make_rotation(ax, 0.0, 0.0),
        );

        let expected = volume.geometry().physical_to_continuous_index(&Point::new([px, py, pz]));

        let points = Tensor::<Backend, 2>::from_floats([[px as f32, py as f32, pz as f32]], &device);
        let indices: Vec<f32> = volume.world_to_index_tensor(points).into_data().iter::<f32>().collect();

        for axis in 0..3 {
            prop_assert!((indices[axis] as f64 - expected[axis]).abs() < 1e-3);
        }
    }
}
