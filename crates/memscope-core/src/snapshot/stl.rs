//! libstdc++ container layouts for snapshot fixtures.
//!
//! Only the members the decoders read are modelled:
//!
//! - `std::map<K, V>`: `_M_t._M_impl._M_header` (the sentinel node) and
//!   `_M_t._M_impl._M_node_count`; nodes carry `_M_parent`, `_M_left`,
//!   `_M_right` and the `std::pair<const K, V>` in `_M_value_field`
//! - `std::vector<T>`: `_M_impl._M_start`, `_M_finish`, `_M_end_of_storage`
//!
//! [`write_map`] lays out a real binary search tree (parent links, header
//! sentinel, leftmost/rightmost) from keys in insertion order, so the
//! in-order walk is exercised against whatever shape the insertions produce.

use crate::decoders::ordered_map::node_type;
use crate::error::{InspectError, InspectResult};
use crate::snapshot::{SnapshotBuilder, TypeCatalog};
use crate::types::{Address, Scalar};

/// Base node type every tree node pointer is declared as.
pub const RB_NODE_BASE: &str = "std::_Rb_tree_node_base";

/// Type names of one `std::map` instantiation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapTypes
{
    /// `std::map<K, V>`
    pub map: String,
    /// `std::_Rb_tree_node<std::pair<const K, V>>`
    pub node: String,
    /// `std::pair<const K, V>`
    pub pair: String,
}

/// Define `std::map<key, value>` and its node types.
///
/// `key` and `value` must already be in the catalogue.
///
/// ## Errors
///
/// `UnknownType` if either is missing.
pub fn define_map(catalog: &mut TypeCatalog, key: &str, value: &str) -> InspectResult<MapTypes>
{
    if !catalog.contains(RB_NODE_BASE) {
        let base_ptr = format!("{RB_NODE_BASE} *");
        catalog.define_struct_at(
            RB_NODE_BASE,
            32,
            &[
                ("_M_color", "int", 0),
                ("_M_parent", base_ptr.as_str(), 8),
                ("_M_left", base_ptr.as_str(), 16),
                ("_M_right", base_ptr.as_str(), 24),
            ],
        );
    }

    let types = MapTypes {
        map: format!("std::map<{key}, {value}>"),
        node: node_type(key, value),
        pair: format!("std::pair<const {key}, {value}>"),
    };
    let tree = format!("std::_Rb_tree<{key}, {}>", types.pair);
    let tree_impl = format!("{tree}::_Rb_tree_impl");

    catalog.define_struct(&types.pair, &[("first", key), ("second", value)])?;

    let base_ptr = format!("{RB_NODE_BASE} *");
    let pair_align = catalog.align_of(&types.pair)?.max(8);
    let value_offset = 32u64.next_multiple_of(pair_align);
    let node_size = (value_offset + catalog.size_of(&types.pair)?).next_multiple_of(pair_align);
    catalog.define_struct_at(
        &types.node,
        node_size,
        &[
            ("_M_color", "int", 0),
            ("_M_parent", base_ptr.as_str(), 8),
            ("_M_left", base_ptr.as_str(), 16),
            ("_M_right", base_ptr.as_str(), 24),
            ("_M_value_field", types.pair.as_str(), value_offset),
        ],
    );

    catalog.define_struct(&tree_impl, &[("_M_header", RB_NODE_BASE), ("_M_node_count", "size_t")])?;
    catalog.define_struct(&tree, &[("_M_impl", tree_impl.as_str())])?;
    catalog.define_struct(&types.map, &[("_M_t", tree.as_str())])?;
    Ok(types)
}

struct TreeSlot<K>
{
    key: K,
    address: Address,
    parent: Option<usize>,
    left: Option<usize>,
    right: Option<usize>,
}

/// Lay out a tree holding `keys` (inserted in order) inside the map at
/// `map_address`. `write_pair` fills in each node's `std::pair` given its
/// address.
///
/// Returns the node addresses in insertion order.
///
/// ## Errors
///
/// Anything the catalogue or `write_pair` reports.
pub fn write_map<K, F>(
    builder: &mut SnapshotBuilder,
    catalog: &TypeCatalog,
    types: &MapTypes,
    map_address: Address,
    keys: &[K],
    mut write_pair: F,
) -> InspectResult<Vec<Address>>
where
    K: Ord + Copy,
    F: FnMut(&mut SnapshotBuilder, Address, K) -> InspectResult<()>,
{
    let node_size = catalog.size_of(&types.node)?;
    let (pair_offset, _) = catalog.offset_of(&types.node, "_M_value_field")?;

    let mut slots: Vec<TreeSlot<K>> = Vec::with_capacity(keys.len());
    for &key in keys {
        let address = builder.alloc("rb node", node_size);
        write_pair(builder, address + pair_offset, key)?;

        let index = slots.len();
        let mut parent = None;
        let mut cursor = (!slots.is_empty()).then_some(0);
        while let Some(at) = cursor {
            parent = Some(at);
            cursor = if key < slots[at].key { slots[at].left } else { slots[at].right };
        }
        if let Some(p) = parent {
            if key < slots[p].key {
                slots[p].left = Some(index);
            } else {
                slots[p].right = Some(index);
            }
        }
        slots.push(TreeSlot {
            key,
            address,
            parent,
            left: None,
            right: None,
        });
    }

    let (header_offset, _) = catalog.offset_of(&types.map, "_M_t._M_impl._M_header")?;
    let header = map_address + header_offset;
    let address_of = |slot: Option<usize>| slot.map_or(Address::NULL, |i| slots[i].address);

    for slot in &slots {
        let parent = slot.parent.map_or(header, |i| slots[i].address);
        builder.set_pointer(catalog, &types.node, slot.address, "_M_parent", parent)?;
        builder.set_pointer(catalog, &types.node, slot.address, "_M_left", address_of(slot.left))?;
        builder.set_pointer(catalog, &types.node, slot.address, "_M_right", address_of(slot.right))?;
    }

    let extreme = |step: fn(&TreeSlot<K>) -> Option<usize>| {
        let mut at = (!slots.is_empty()).then_some(0);
        while let Some(next) = at.and_then(|i| step(&slots[i])) {
            at = Some(next);
        }
        at
    };
    let (leftmost, rightmost) = (extreme(|s| s.left), extreme(|s| s.right));

    // an empty libstdc++ map points the header at itself
    let (root, left, right) = if slots.is_empty() {
        (Address::NULL, header, header)
    } else {
        (slots[0].address, address_of(leftmost), address_of(rightmost))
    };
    builder.set_pointer(catalog, RB_NODE_BASE, header, "_M_parent", root)?;
    builder.set_pointer(catalog, RB_NODE_BASE, header, "_M_left", left)?;
    builder.set_pointer(catalog, RB_NODE_BASE, header, "_M_right", right)?;
    builder.set_field(
        catalog,
        &types.map,
        map_address,
        "_M_t._M_impl._M_node_count",
        Scalar::Unsigned(slots.len() as u64),
    )?;

    Ok(slots.iter().map(|slot| slot.address).collect())
}

/// Define `std::vector<element>`.
///
/// ## Errors
///
/// `UnknownType` if `element` is not in the catalogue.
pub fn define_vector(catalog: &mut TypeCatalog, element: &str) -> InspectResult<String>
{
    let vector = format!("std::vector<{element}>");
    let vector_impl = format!("{vector}::_Vector_impl");
    let pointer = format!("{element} *");
    catalog.define_struct(
        &vector_impl,
        &[
            ("_M_start", pointer.as_str()),
            ("_M_finish", pointer.as_str()),
            ("_M_end_of_storage", pointer.as_str()),
        ],
    )?;
    catalog.define_struct(&vector, &[("_M_impl", vector_impl.as_str())])?;
    Ok(vector)
}

/// Point the vector at `vector_address` to `len` elements starting at `data`.
///
/// ## Errors
///
/// `InvalidArgument` if `vector_type` holds zero-sized elements, otherwise
/// whatever the writes report.
pub fn write_vector(
    builder: &mut SnapshotBuilder,
    catalog: &TypeCatalog,
    vector_type: &str,
    vector_address: Address,
    data: Address,
    len: u64,
) -> InspectResult<()>
{
    let (_, pointer) = catalog.offset_of(vector_type, "_M_impl._M_start")?;
    let element = pointer.trim_end_matches('*').trim().to_string();
    let size = catalog.size_of(&element)?;
    if size == 0 {
        return Err(InspectError::InvalidArgument(format!("{vector_type} has zero-sized elements")));
    }

    let finish = data + len * size;
    builder.set_pointer(catalog, vector_type, vector_address, "_M_impl._M_start", data)?;
    builder.set_pointer(catalog, vector_type, vector_address, "_M_impl._M_finish", finish)?;
    builder.set_pointer(catalog, vector_type, vector_address, "_M_impl._M_end_of_storage", finish)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::snapshot::SnapshotBuilder;
    use crate::types::ScalarKind;

    #[test]
    fn test_write_map_links_header_and_nodes()
    {
        let mut catalog = TypeCatalog::new();
        let types = define_map(&mut catalog, "int", "double").unwrap();
        let mut builder = SnapshotBuilder::new();
        let map = builder.alloc("map", catalog.size_of(&types.map).unwrap());

        let nodes = write_map(&mut builder, &catalog, &types, map, &[15, 5, 10], |b, pair, key| {
            b.write_scalar(pair, ScalarKind::I32, Scalar::Signed(key))
        })
        .unwrap();
        let snapshot = builder.build();

        let (count_offset, _) = catalog.offset_of(&types.map, "_M_t._M_impl._M_node_count").unwrap();
        assert_eq!(snapshot.read_u64(map + count_offset).unwrap(), 3);

        // header._M_left is the leftmost node (key 5)
        let (left_offset, _) = catalog.offset_of(&types.map, "_M_t._M_impl._M_header._M_left").unwrap();
        assert_eq!(snapshot.read_pointer(map + left_offset).unwrap(), nodes[1]);

        // root's parent is the header
        let (header_offset, _) = catalog.offset_of(&types.map, "_M_t._M_impl._M_header").unwrap();
        assert_eq!(snapshot.read_pointer(nodes[0] + 8).unwrap(), map + header_offset);
    }

    #[test]
    fn test_empty_map_header_points_at_itself()
    {
        let mut catalog = TypeCatalog::new();
        let types = define_map(&mut catalog, "int", "int").unwrap();
        let mut builder = SnapshotBuilder::new();
        let map = builder.alloc("map", catalog.size_of(&types.map).unwrap());
        write_map::<i64, _>(&mut builder, &catalog, &types, map, &[], |_, _, _| Ok(())).unwrap();

        let snapshot = builder.build();
        let (left_offset, _) = catalog.offset_of(&types.map, "_M_t._M_impl._M_header._M_left").unwrap();
        assert_eq!(snapshot.read_pointer(map + left_offset).unwrap(), map);
    }
}
