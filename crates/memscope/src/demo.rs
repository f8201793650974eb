//! Built-in memory images for trying decoders without a debugger.
//!
//! Each scenario lays out one value the way the tractography program would
//! hold it in memory, under the configured namespaces, and returns a handle
//! to it.

use std::sync::Arc;

use clap::ValueEnum;
use memscope_core::config::{EngineConfig, Namespace};
use memscope_core::snapshot::stl::{define_map, define_vector, write_map, write_vector, MapTypes};
use memscope_core::snapshot::{SnapshotBuilder, SnapshotValue, TypeCatalog};
use memscope_core::types::{Address, Scalar, ScalarKind};
use memscope_core::value::Handle;
use memscope_core::InspectResult;
use memscope_utils::debug;

/// Which value to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario
{
    /// Math vector of three doubles
    Vector,
    /// 2x3 matrix inside padded rows of four
    Matrix,
    /// `std::map<int, double>` filled out of order
    Map,
    /// Expected-image buffer selected by its `type` tag
    Variant,
    /// Plain image buffer of voxels
    Buffer,
    /// Fibre strand of degree three
    Strand,
}

struct Scene
{
    ns: Namespace,
    catalog: TypeCatalog,
    builder: SnapshotBuilder,
}

impl Scene
{
    fn new(config: &EngineConfig) -> Self
    {
        Self {
            ns: config.namespace.clone(),
            catalog: TypeCatalog::new(),
            builder: SnapshotBuilder::new().with_string_limit(config.max_string_len),
        }
    }

    fn alloc(&mut self, type_name: &str) -> InspectResult<Address>
    {
        let size = self.catalog.size_of(type_name)?;
        Ok(self.builder.alloc(type_name, size))
    }

    fn set(&mut self, type_name: &str, base: Address, path: &str, value: Scalar) -> InspectResult<()>
    {
        self.builder.set_field(&self.catalog, type_name, base, path, value)
    }

    fn point(&mut self, type_name: &str, base: Address, path: &str, target: Address) -> InspectResult<()>
    {
        self.builder.set_pointer(&self.catalog, type_name, base, path, target)
    }

    fn finish(self, type_name: &str, address: Address) -> Handle
    {
        let memory = Arc::new(self.builder.build());
        debug!(regions = memory.regions().len(), type_name, %address, "demo image built");
        SnapshotValue::handle(&memory, &Arc::new(self.catalog), type_name, address)
    }

    fn vector(mut self) -> InspectResult<Handle>
    {
        let vector = format!("{}<double>", self.ns.math_type("Vector"));
        self.catalog
            .define_struct(&vector, &[("size", "size_t"), ("stride", "size_t"), ("data", "double *")])?;

        let data = self.builder.alloc_f64s("vector data", &[7.0, 8.0, 9.0]);
        let address = self.alloc(&vector)?;
        self.set(&vector, address, "size", Scalar::Unsigned(3))?;
        self.set(&vector, address, "stride", Scalar::Unsigned(1))?;
        self.point(&vector, address, "data", data)?;
        Ok(self.finish(&vector, address))
    }

    fn matrix(mut self) -> InspectResult<Handle>
    {
        let matrix = format!("{}<double>", self.ns.math_type("Matrix"));
        self.catalog.define_struct(
            &matrix,
            &[("size1", "size_t"), ("size2", "size_t"), ("tda", "size_t"), ("data", "double *")],
        )?;

        let data = self
            .builder
            .alloc_f64s("matrix data", &[1.0, 2.0, 3.0, f64::NAN, 4.0, 5.0, 6.0, f64::NAN]);
        let address = self.alloc(&matrix)?;
        self.set(&matrix, address, "size1", Scalar::Unsigned(2))?;
        self.set(&matrix, address, "size2", Scalar::Unsigned(3))?;
        self.set(&matrix, address, "tda", Scalar::Unsigned(4))?;
        self.point(&matrix, address, "data", data)?;
        Ok(self.finish(&matrix, address))
    }

    fn map(mut self) -> InspectResult<Handle>
    {
        let types = define_map(&mut self.catalog, "int", "double")?;
        let address = self.alloc(&types.map)?;
        let (key_offset, _) = self.catalog.offset_of(&types.pair, "first")?;
        let (value_offset, _) = self.catalog.offset_of(&types.pair, "second")?;

        write_map(
            &mut self.builder,
            &self.catalog,
            &types,
            address,
            &[15i64, 5, 10],
            |builder, pair, key| {
                builder.write_scalar(pair + key_offset, ScalarKind::I32, Scalar::Signed(key))?;
                builder.write_f64(pair + value_offset, key as f64 / 10.0)
            },
        )?;
        Ok(self.finish(&types.map, address))
    }

    /// Coordinate, `Voxel<double>` and the intensities vector they share.
    fn define_image(&mut self, voxels: &[String]) -> InspectResult<String>
    {
        let image = self.ns.qualify("Image");
        self.catalog
            .define_struct(&format!("{image}::Coord"), &[("x", "int"), ("y", "int"), ("z", "int")])?;
        let intensities = define_vector(&mut self.catalog, "double")?;
        self.catalog
            .define_struct(&format!("{image}::Voxel<double>"), &[("intensities", intensities.as_str())])?;
        for voxel in voxels {
            self.catalog.define_struct(voxel, &[("intensities", intensities.as_str())])?;
        }
        Ok(image)
    }

    fn define_buffer(&mut self, buffer: &str, voxel: &str) -> InspectResult<MapTypes>
    {
        let key = format!("{}::Coord", self.ns.qualify("Image"));
        let types = define_map(&mut self.catalog, &key, voxel)?;
        self.catalog
            .define_struct(buffer, &[("type", "const char *"), ("voxels", types.map.as_str())])?;
        Ok(types)
    }

    /// Three voxels, each with two intensities derived from its coordinate.
    fn fill_buffer(&mut self, types: &MapTypes, buffer: &str, address: Address, tag: &str) -> InspectResult<()>
    {
        let coords = [(2i64, 0i64, 1i64), (0, 1, 1), (1, 1, 0)];
        let tag = self.builder.alloc_cstring(tag);
        self.point(buffer, address, "type", tag)?;

        let key_type = format!("{}::Coord", self.ns.qualify("Image"));
        let (map_offset, _) = self.catalog.offset_of(buffer, "voxels")?;
        let (key_offset, _) = self.catalog.offset_of(&types.pair, "first")?;
        let (value_offset, value_type) = self.catalog.offset_of(&types.pair, "second")?;
        let (vector_offset, vector_type) = self.catalog.offset_of(&value_type, "intensities")?;
        let catalog = &self.catalog;

        write_map(
            &mut self.builder,
            catalog,
            types,
            address + map_offset,
            &coords,
            |builder, pair, (x, y, z)| {
                let key = pair + key_offset;
                builder.set_field(catalog, &key_type, key, "x", Scalar::Signed(x))?;
                builder.set_field(catalog, &key_type, key, "y", Scalar::Signed(y))?;
                builder.set_field(catalog, &key_type, key, "z", Scalar::Signed(z))?;
                let base = (x + y + z) as f64;
                let data = builder.alloc_f64s("intensities", &[base, base * 0.5]);
                write_vector(builder, catalog, &vector_type, pair + value_offset + vector_offset, data, 2)
            },
        )?;
        Ok(())
    }

    fn variant(mut self) -> InspectResult<Handle>
    {
        let expected = format!("{}::Expected", self.ns.qualify("Image"));
        let voxel = format!("{expected}::Gaussian::Voxel");
        let image = self.define_image(std::slice::from_ref(&voxel))?;

        let base = format!("{expected}::Buffer");
        self.define_buffer(&base, &format!("{image}::Voxel<double>"))?;
        let types = self.define_buffer(&format!("{expected}::Gaussian::Buffer"), &voxel)?;

        let address = self.alloc(&base)?;
        self.fill_buffer(&types, &base, address, "gaussian")?;
        Ok(self.finish(&base, address))
    }

    fn buffer(mut self) -> InspectResult<Handle>
    {
        let image = self.define_image(&[])?;
        let buffer = format!("{image}::Buffer");
        let types = self.define_buffer(&buffer, &format!("{image}::Voxel<double>"))?;

        let address = self.alloc(&buffer)?;
        self.fill_buffer(&types, &buffer, address, "")?;
        Ok(self.finish(&buffer, address))
    }

    fn strand(mut self) -> InspectResult<Handle>
    {
        let strand = self.ns.qualify("Fibre::Strand");
        self.catalog
            .define_struct(&strand, &[("data", "double *"), ("stride", "size_t"), ("sze", "size_t")])?;

        let points = [0.0, 0.0, 0.0, 1.0, 0.5, 0.0, 2.0, 1.5, 0.25];
        let data = self.builder.alloc_f64s("strand data", &points);
        let address = self.alloc(&strand)?;
        self.point(&strand, address, "data", data)?;
        self.set(&strand, address, "stride", Scalar::Unsigned(1))?;
        self.set(&strand, address, "sze", Scalar::Unsigned(3))?;
        Ok(self.finish(&strand, address))
    }
}

/// Build the image for `scenario` and return a handle to its value.
///
/// ## Errors
///
/// Only if a layout step fails, which would be a bug in the scenario.
pub fn build(scenario: Scenario, config: &EngineConfig) -> InspectResult<Handle>
{
    let scene = Scene::new(config);
    match scenario {
        Scenario::Vector => scene.vector(),
        Scenario::Matrix => scene.matrix(),
        Scenario::Map => scene.map(),
        Scenario::Variant => scene.variant(),
        Scenario::Buffer => scene.buffer(),
        Scenario::Strand => scene.strand(),
    }
}
