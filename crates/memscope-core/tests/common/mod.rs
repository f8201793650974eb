//! Shared fixtures: small memory images laid out like the real program's types.

#![allow(dead_code)]

use std::sync::Arc;

use memscope_core::error::InspectResult;
use memscope_core::snapshot::stl::{define_map, define_vector, write_map, write_vector, MapTypes};
use memscope_core::snapshot::{Snapshot, SnapshotBuilder, SnapshotValue, TypeCatalog};
use memscope_core::types::{Address, Scalar, ScalarKind};
use memscope_core::value::Handle;

pub const VECTOR: &str = "MR::Math::Vector<double>";
pub const MATRIX: &str = "MR::Math::Matrix<double>";
pub const COORD: &str = "BTS::Image::Coord";
pub const VOXEL: &str = "BTS::Image::Voxel<double>";
pub const EXPECTED_BUFFER: &str = "BTS::Image::Expected::Buffer";

/// Catalogue and image under construction
pub struct Fixture
{
    pub catalog: TypeCatalog,
    pub builder: SnapshotBuilder,
}

/// Finished image, ready to hand out handles
pub struct Image
{
    pub memory: Arc<Snapshot>,
    pub catalog: Arc<TypeCatalog>,
}

impl Image
{
    pub fn handle(&self, type_name: &str, address: Address) -> Handle
    {
        SnapshotValue::handle(&self.memory, &self.catalog, type_name, address)
    }
}

impl Fixture
{
    pub fn new() -> Self
    {
        let mut catalog = TypeCatalog::new();
        define_math(&mut catalog).unwrap();
        Self {
            catalog,
            builder: SnapshotBuilder::new(),
        }
    }

    pub fn finish(self) -> Image
    {
        Image {
            memory: Arc::new(self.builder.build()),
            catalog: Arc::new(self.catalog),
        }
    }

    pub fn alloc(&mut self, type_name: &str) -> Address
    {
        let size = self.catalog.size_of(type_name).unwrap();
        self.builder.alloc(type_name, size)
    }

    pub fn set(&mut self, type_name: &str, base: Address, path: &str, value: Scalar)
    {
        self.builder.set_field(&self.catalog, type_name, base, path, value).unwrap();
    }

    pub fn point(&mut self, type_name: &str, base: Address, path: &str, target: Address)
    {
        self.builder.set_pointer(&self.catalog, type_name, base, path, target).unwrap();
    }

    /// A math vector of `len` elements, `stride` apart, over `storage`.
    pub fn vector(&mut self, storage: &[f64], len: u64, stride: u64) -> Address
    {
        let data = self.builder.alloc_f64s("vector data", storage);
        let vector = self.alloc(VECTOR);
        self.set(VECTOR, vector, "size", Scalar::Unsigned(len));
        self.set(VECTOR, vector, "stride", Scalar::Unsigned(stride));
        self.point(VECTOR, vector, "data", data);
        vector
    }

    /// A math matrix viewing `storage` with row stride `tda`.
    pub fn matrix(&mut self, storage: &[f64], rows: u64, cols: u64, tda: u64) -> Address
    {
        let data = self.builder.alloc_f64s("matrix data", storage);
        let matrix = self.alloc(MATRIX);
        self.set(MATRIX, matrix, "size1", Scalar::Unsigned(rows));
        self.set(MATRIX, matrix, "size2", Scalar::Unsigned(cols));
        self.set(MATRIX, matrix, "tda", Scalar::Unsigned(tda));
        self.point(MATRIX, matrix, "data", data);
        matrix
    }

    /// A `std::map<int, double>` built by inserting `entries` in order.
    pub fn int_map(&mut self, entries: &[(i64, f64)]) -> (MapTypes, Address, Vec<Address>)
    {
        let types = define_map(&mut self.catalog, "int", "double").unwrap();
        let map = self.alloc(&types.map);
        let keys: Vec<i64> = entries.iter().map(|(key, _)| *key).collect();
        let (key_offset, _) = self.catalog.offset_of(&types.pair, "first").unwrap();
        let (value_offset, _) = self.catalog.offset_of(&types.pair, "second").unwrap();
        let nodes = write_map(&mut self.builder, &self.catalog, &types, map, &keys, |builder, pair, key| {
            let value = entries.iter().find(|(k, _)| *k == key).map_or(0.0, |(_, v)| *v);
            builder.write_scalar(pair + key_offset, ScalarKind::I32, Scalar::Signed(key))?;
            builder.write_f64(pair + value_offset, value)
        })
        .unwrap();
        (types, map, nodes)
    }

    /// Define an image buffer type `buffer` holding `voxel`s keyed by
    /// coordinate, with a `type` tag.
    pub fn define_buffer(&mut self, buffer: &str, voxel: &str) -> MapTypes
    {
        let types = define_map(&mut self.catalog, COORD, voxel).unwrap();
        self.catalog
            .define_struct(buffer, &[("type", "const char *"), ("voxels", types.map.as_str())])
            .unwrap();
        types
    }

    /// Fill the buffer at `buffer_address` with one voxel per coordinate,
    /// each holding `intensities`. Returns the tree nodes in insertion order.
    pub fn write_buffer(
        &mut self,
        types: &MapTypes,
        buffer: &str,
        buffer_address: Address,
        tag: &str,
        coords: &[(i64, i64, i64)],
        intensities: &[f64],
    ) -> InspectResult<Vec<Address>>
    {
        let tag = self.builder.alloc_cstring(tag);
        self.builder.set_pointer(&self.catalog, buffer, buffer_address, "type", tag)?;

        let (map_offset, _) = self.catalog.offset_of(buffer, "voxels")?;
        let (key_offset, _) = self.catalog.offset_of(&types.pair, "first")?;
        let (value_offset, value_type) = self.catalog.offset_of(&types.pair, "second")?;
        let (vector_offset, vector_type) = self.catalog.offset_of(&value_type, "intensities")?;
        let catalog = &self.catalog;

        write_map(
            &mut self.builder,
            catalog,
            types,
            buffer_address + map_offset,
            coords,
            |builder, pair, (x, y, z)| {
                let key = pair + key_offset;
                builder.set_field(catalog, COORD, key, "x", Scalar::Signed(x))?;
                builder.set_field(catalog, COORD, key, "y", Scalar::Signed(y))?;
                builder.set_field(catalog, COORD, key, "z", Scalar::Signed(z))?;
                let data = builder.alloc_f64s("intensities", intensities);
                write_vector(
                    builder,
                    catalog,
                    &vector_type,
                    pair + value_offset + vector_offset,
                    data,
                    intensities.len() as u64,
                )
            },
        )
    }
}

/// Math vector and matrix layouts.
pub fn define_math(catalog: &mut TypeCatalog) -> InspectResult<()>
{
    catalog.define_struct(VECTOR, &[("size", "size_t"), ("stride", "size_t"), ("data", "double *")])?;
    catalog.define_struct(
        MATRIX,
        &[("size1", "size_t"), ("size2", "size_t"), ("tda", "size_t"), ("data", "double *")],
    )?;
    Ok(())
}

/// Image coordinate and the voxel types used by buffer fixtures.
pub fn define_image(catalog: &mut TypeCatalog, voxels: &[&str]) -> InspectResult<()>
{
    catalog.define_struct(COORD, &[("x", "int"), ("y", "int"), ("z", "int")])?;
    let intensities = define_vector(catalog, "double")?;
    catalog.define_struct(VOXEL, &[("intensities", intensities.as_str())])?;
    for voxel in voxels {
        catalog.define_struct(voxel, &[("intensities", intensities.as_str())])?;
    }
    Ok(())
}
