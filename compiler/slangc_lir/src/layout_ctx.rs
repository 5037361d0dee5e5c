use crate::lir::LirCtx;
use crate::syntax::{HandleKind, LirDefs, LirTy};
use slangc_abi::layout::{BackendRepr, FloatWidth, Integer, Layout, Primitive, TyAndLayout};
use slangc_abi::size_and_align::{AbiAndPrefAlign, Size};
use slangc_abi::target::AddressSpace;

pub struct LayoutCtx<'a> {
    lir_ty_ctx: &'a LirCtx,
    defs: &'a LirDefs,
}

impl<'a> LayoutCtx<'a> {
    // It accepts the `LirCtx` because it contains the `TargetDataLayout`, and
    // the struct/enum definition tables needed to recurse into aggregates.
    pub fn new(lir_ty_ctx: &'a LirCtx, defs: &'a LirDefs) -> Self {
        LayoutCtx { lir_ty_ctx, defs }
    }

    /// Computes the layout for a given type. We should cache the results
    /// to avoid recomputing the layout for the same type multiple times.
    pub fn compute_layout(&self, ty: LirTy) -> TyAndLayout<LirTy> {
        let data_layout = &self.lir_ty_ctx.target().data_layout;

        let (size, align, backend_repr) = match &ty {
            LirTy::Int { width, signed } => {
                let align = match width {
                    Integer::I8 => data_layout.i8_align,
                    Integer::I16 => data_layout.i16_align,
                    Integer::I32 => data_layout.i32_align,
                    Integer::I64 => data_layout.i64_align,
                    Integer::I128 => data_layout.i128_align,
                };
                (
                    width.size(),
                    align,
                    BackendRepr::Scalar(Primitive::Int {
                        width: *width,
                        signed: *signed,
                    }),
                )
            }
            LirTy::Float(width) => {
                let align = match width {
                    FloatWidth::F32 => data_layout.f32_align,
                    FloatWidth::F64 => data_layout.f64_align,
                };
                (
                    width.size(),
                    align,
                    BackendRepr::Scalar(Primitive::Float(*width)),
                )
            }
            LirTy::Bool => (
                Size::from_bytes_const(1),
                data_layout.i8_align,
                BackendRepr::Scalar(Primitive::Int {
                    width: Integer::I8,
                    signed: false,
                }),
            ),
            LirTy::Unit => (Size::ZERO, AbiAndPrefAlign::new(1, 1), BackendRepr::Memory { sized: true }),
            // `{ i8* data, i32 size }`, see §4.4.1.
            LirTy::Str => {
                let pointer = Primitive::Pointer(AddressSpace::DATA);
                let len = Primitive::Int {
                    width: Integer::I32,
                    signed: false,
                };
                (
                    pointer.size().align_to(data_layout.pointer_align.abi).checked_add(len.size()).unwrap(),
                    data_layout.pointer_align,
                    BackendRepr::ScalarPair(pointer, len),
                )
            }
            LirTy::Handle(
                HandleKind::Stdin | HandleKind::Stdout | HandleKind::Stderr | HandleKind::File,
            ) => (
                Size::from_bytes(data_layout.pointer_size),
                data_layout.pointer_align,
                BackendRepr::Scalar(Primitive::Pointer(AddressSpace::DATA)),
            ),
            LirTy::Array { elem, len } => {
                let elem_layout = self.compute_layout((**elem).clone());
                let stride = elem_layout.layout.size.align_to(elem_layout.layout.align.abi);
                (
                    Size::from_bytes(stride.bytes().saturating_mul(*len)),
                    elem_layout.layout.align,
                    BackendRepr::Memory { sized: true },
                )
            }
            // `{ i32 len, i32 cap, T* data }`, see §4.4.3.
            LirTy::DynArray { .. } | LirTy::List(_) => (
                Size::from_bytes(4u64)
                    .checked_add(Size::from_bytes(4u64))
                    .unwrap()
                    .checked_add(Size::from_bytes(data_layout.pointer_size))
                    .unwrap(),
                data_layout.pointer_align,
                BackendRepr::Memory { sized: true },
            ),
            // `{ T* value }`, see §4.4.3.
            LirTy::Box(_) => (
                Size::from_bytes(data_layout.pointer_size),
                data_layout.pointer_align,
                BackendRepr::Scalar(Primitive::Pointer(AddressSpace::DATA)),
            ),
            // Tag-plus-payload, see §4.4.1/§4.4.3.
            LirTy::Optional(inner) => self.tagged_union_layout(&[inner.as_ref()]),
            LirTy::Result { ok, err } => self.tagged_union_layout(&[ok.as_ref(), err.as_ref()]),
            LirTy::HashMap { .. } => (
                Size::from_bytes(4u64)
                    .checked_add(Size::from_bytes(4u64))
                    .unwrap()
                    .checked_add(Size::from_bytes(data_layout.pointer_size))
                    .unwrap(),
                data_layout.pointer_align,
                BackendRepr::Memory { sized: true },
            ),
            LirTy::Ref { .. } => (
                Size::from_bytes(data_layout.pointer_size),
                data_layout.pointer_align,
                BackendRepr::Scalar(Primitive::Pointer(AddressSpace::DATA)),
            ),
            LirTy::Iterator(_) => (
                Size::from_bytes(data_layout.pointer_size),
                data_layout.pointer_align,
                BackendRepr::Memory { sized: true },
            ),
            LirTy::Struct(def_id) => {
                let def = &self.defs.structs[*def_id];
                let field_tys: Vec<LirTy> = def.fields.iter().map(|(_, t)| t.clone()).collect();
                self.aggregate_layout(&field_tys)
            }
            LirTy::Enum(def_id) => {
                let def = &self.defs.enums[*def_id];
                let payload_tys: Vec<LirTy> = def
                    .variants
                    .iter()
                    .flat_map(|v| v.payload.iter().cloned())
                    .collect();
                self.tagged_union_layout(&payload_tys.iter().collect::<Vec<_>>())
            }
            LirTy::Metadata => (
                Size::from_bits(0u64),
                AbiAndPrefAlign::new(1, 1),
                BackendRepr::Memory { sized: false },
            ),
        };

        TyAndLayout {
            ty,
            layout: Layout {
                size,
                align,
                backend_repr,
            },
        }
    }

    /// `{ i32 tag, [N x i8] data }` where `N` is the maximum payload size
    /// over all variants (§4.4.1).
    fn tagged_union_layout(&self, payloads: &[&LirTy]) -> (Size, AbiAndPrefAlign, BackendRepr) {
        let tag = Size::from_bytes(4u64);
        let mut max_payload = Size::ZERO;
        let mut align = AbiAndPrefAlign::new(4, 4);
        for payload in payloads {
            let layout = self.compute_layout((*payload).clone());
            if layout.layout.size.bytes() > max_payload.bytes() {
                max_payload = layout.layout.size;
            }
            if layout.layout.align.abi.bytes() > align.abi.bytes() {
                align = layout.layout.align;
            }
        }
        let size = tag.align_to(align.abi).checked_add(max_payload).unwrap();
        (size, align, BackendRepr::Memory { sized: true })
    }

    /// Struct layout: fields concatenated in declaration order (§4.4.1).
    fn aggregate_layout(&self, fields: &[LirTy]) -> (Size, AbiAndPrefAlign, BackendRepr) {
        let mut offset = Size::ZERO;
        let mut align = AbiAndPrefAlign::new(1, 1);
        for field in fields {
            let layout = self.compute_layout(field.clone());
            if layout.layout.align.abi.bytes() > align.abi.bytes() {
                align = layout.layout.align;
            }
            offset = offset
                .align_to(layout.layout.align.abi)
                .checked_add(layout.layout.size)
                .unwrap();
        }
        (offset.align_to(align.abi), align, BackendRepr::Memory { sized: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lir::{EmitKind, LirCtx};
    use slangc_abi::target::BackendKind;

    #[test]
    fn i32_layout_is_four_bytes() {
        let lir_ctx = LirCtx::new(BackendKind::Llvm, EmitKind::Object);
        let defs = LirDefs::new();
        let layout_ctx = LayoutCtx::new(&lir_ctx, &defs);
        let layout = layout_ctx.compute_layout(LirTy::Int {
            width: Integer::I32,
            signed: true,
        });
        assert_eq!(layout.layout.size.bytes(), 4);
        assert!(layout.layout.backend_repr.is_scalar());
    }

    #[test]
    fn unit_is_zero_sized() {
        let lir_ctx = LirCtx::new(BackendKind::Llvm, EmitKind::Object);
        let defs = LirDefs::new();
        let layout_ctx = LayoutCtx::new(&lir_ctx, &defs);
        let layout = layout_ctx.compute_layout(LirTy::Unit);
        assert_eq!(layout.layout.size.bytes(), 0);
    }

    #[test]
    fn string_is_a_scalar_pair() {
        let lir_ctx = LirCtx::new(BackendKind::Llvm, EmitKind::Object);
        let defs = LirDefs::new();
        let layout_ctx = LayoutCtx::new(&lir_ctx, &defs);
        let layout = layout_ctx.compute_layout(LirTy::Str);
        assert!(matches!(
            layout.layout.backend_repr,
            BackendRepr::ScalarPair(_, _)
        ));
    }
}
