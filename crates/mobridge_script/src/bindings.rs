//! Bridge function table exposed to scripts as `Sys*` globals.
//!
//! Handles and raw addresses cross the boundary as f64 bit patterns
//! (QuickJS numbers); every bridge failure surfaces as a JS exception
//! instead of corrupting memory. The native side still populates event
//! records through addresses obtained with `SysBufferGetBytePointer`.

use std::cell::RefCell;
use std::rc::Rc;

use rquickjs::{Ctx, Exception, Function, IntoJs, Object, Value};
use tracing::debug;

use mobridge_event::{kind, EventError, EventRecord, LocationRecord, WidgetRecord};
use mobridge_geom::{CopyDataRequest, PointBox, RectBox};
use mobridge_memory::{bits, scalar_width, BufferArena, BufferHandle, RawAddr, ScalarKind};
use mobridge_text::{narrow_to_wide, pack_rgb, wide_to_narrow};

use crate::runtime::{ScriptError, ScriptRuntime};

/// Arena shared between the host and the script closures.
pub type SharedArena = Rc<RefCell<BufferArena>>;

/// Install the `Sys*` bridge globals into the runtime's context.
pub fn register_bridge(runtime: &ScriptRuntime, arena: SharedArena) -> Result<(), ScriptError> {
    runtime.context.with(|ctx| -> rquickjs::Result<()> {
        let globals = ctx.globals();
        register_memory(&ctx, &globals, &arena)?;
        register_bits(&ctx, &globals)?;
        register_events(&ctx, &globals, &arena)?;
        register_widgets(&ctx, &globals)?;
        register_geometry(&ctx, &globals, &arena)?;
        register_strings(&ctx, &globals, &arena)?;
        Ok(())
    })?;
    debug!("bridge globals registered");
    Ok(())
}

fn js_err<'js>(ctx: &Ctx<'js>, err: impl std::fmt::Display) -> rquickjs::Error {
    Exception::throw_message(ctx, &err.to_string())
}

fn handle_bits(handle: BufferHandle) -> f64 {
    handle.to_bits() as f64
}

fn handle_arg(bits: f64) -> BufferHandle {
    BufferHandle::from_bits(bits as u64)
}

fn index_arg(ctx: &Ctx<'_>, index: i32) -> rquickjs::Result<usize> {
    usize::try_from(index).map_err(|_| js_err(ctx, format!("negative index {index}")))
}

fn register_memory<'js>(
    ctx: &Ctx<'js>,
    globals: &Object<'js>,
    arena: &SharedArena,
) -> rquickjs::Result<()> {
    let a = arena.clone();
    globals.set(
        "SysAlloc",
        Function::new(ctx.clone(), move |ctx: Ctx, size: i32| -> rquickjs::Result<f64> {
            let size = usize::try_from(size)
                .map_err(|_| js_err(&ctx, format!("negative allocation size {size}")))?;
            let handle = a.borrow_mut().allocate(size).map_err(|e| js_err(&ctx, e))?;
            Ok(handle_bits(handle))
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysFree",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<()> {
            a.borrow_mut()
                .release(handle_arg(h))
                .map_err(|e| js_err(&ctx, e))
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysBufferSize",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<i32> {
            let len = a.borrow().len(handle_arg(h)).map_err(|e| js_err(&ctx, e))?;
            Ok(len as i32)
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysBufferGetInt",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx, h: f64, index: i32| -> rquickjs::Result<i32> {
                let index = index_arg(&ctx, index)?;
                a.borrow()
                    .read_i32(handle_arg(h), index)
                    .map_err(|e| js_err(&ctx, e))
            },
        )?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysBufferSetInt",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx, h: f64, index: i32, value: i32| -> rquickjs::Result<()> {
                let index = index_arg(&ctx, index)?;
                a.borrow_mut()
                    .write_i32(handle_arg(h), index, value)
                    .map_err(|e| js_err(&ctx, e))
            },
        )?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysBufferGetByte",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx, h: f64, index: i32| -> rquickjs::Result<i32> {
                let index = index_arg(&ctx, index)?;
                let byte = a
                    .borrow()
                    .read_u8(handle_arg(h), index)
                    .map_err(|e| js_err(&ctx, e))?;
                Ok(byte as i32)
            },
        )?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysBufferSetByte",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx, h: f64, index: i32, value: i32| -> rquickjs::Result<()> {
                let index = index_arg(&ctx, index)?;
                // Truncation to the low byte is the boundary's contract.
                a.borrow_mut()
                    .write_u8(handle_arg(h), index, value as u8)
                    .map_err(|e| js_err(&ctx, e))
            },
        )?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysBufferGetFloat",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx, h: f64, index: i32| -> rquickjs::Result<f64> {
                let index = index_arg(&ctx, index)?;
                let value = a
                    .borrow()
                    .read_f32(handle_arg(h), index)
                    .map_err(|e| js_err(&ctx, e))?;
                Ok(value as f64)
            },
        )?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysBufferSetFloat",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx, h: f64, index: i32, value: f64| -> rquickjs::Result<()> {
                let index = index_arg(&ctx, index)?;
                a.borrow_mut()
                    .write_f32(handle_arg(h), index, value as f32)
                    .map_err(|e| js_err(&ctx, e))
            },
        )?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysBufferGetDouble",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx, h: f64, index: i32| -> rquickjs::Result<f64> {
                let index = index_arg(&ctx, index)?;
                a.borrow()
                    .read_f64(handle_arg(h), index)
                    .map_err(|e| js_err(&ctx, e))
            },
        )?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysBufferSetDouble",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx, h: f64, index: i32, value: f64| -> rquickjs::Result<()> {
                let index = index_arg(&ctx, index)?;
                a.borrow_mut()
                    .write_f64(handle_arg(h), index, value)
                    .map_err(|e| js_err(&ctx, e))
            },
        )?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysBufferCopyBytes",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx,
                  src: f64,
                  src_offset: i32,
                  dst: f64,
                  dst_offset: i32,
                  count: i32|
                  -> rquickjs::Result<()> {
                let src_offset = index_arg(&ctx, src_offset)?;
                let dst_offset = index_arg(&ctx, dst_offset)?;
                let count = index_arg(&ctx, count)?;
                a.borrow_mut()
                    .copy_bytes(handle_arg(src), src_offset, handle_arg(dst), dst_offset, count)
                    .map_err(|e| js_err(&ctx, e))
            },
        )?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysBufferGetBytePointer",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx, h: f64, index: i32| -> rquickjs::Result<f64> {
                let index = index_arg(&ctx, index)?;
                let addr = a
                    .borrow_mut()
                    .address_of(handle_arg(h), index)
                    .map_err(|e| js_err(&ctx, e))?;
                Ok(addr.to_bits() as f64)
            },
        )?,
    )?;

    globals.set(
        "SysSizeOfInt",
        Function::new(ctx.clone(), || scalar_width(ScalarKind::Int32) as i32)?,
    )?;
    globals.set(
        "SysSizeOfFloat",
        Function::new(ctx.clone(), || scalar_width(ScalarKind::Float32) as i32)?,
    )?;
    globals.set(
        "SysSizeOfDouble",
        Function::new(ctx.clone(), || scalar_width(ScalarKind::Float64) as i32)?,
    )?;

    Ok(())
}

fn register_bits<'js>(ctx: &Ctx<'js>, globals: &Object<'js>) -> rquickjs::Result<()> {
    globals.set(
        "SysBitAnd",
        Function::new(ctx.clone(), |a: i32, b: i32| bits::band(a, b))?,
    )?;
    globals.set(
        "SysBitOr",
        Function::new(ctx.clone(), |a: i32, b: i32| bits::bor(a, b))?,
    )?;
    globals.set(
        "SysBitXor",
        Function::new(ctx.clone(), |a: i32, b: i32| bits::bxor(a, b))?,
    )?;
    globals.set(
        "SysBitNot",
        Function::new(ctx.clone(), |a: i32| bits::bnot(a))?,
    )?;
    globals.set(
        "SysBitShiftLeft",
        Function::new(ctx.clone(), |a: i32, n: i32| bits::shl(a, n as u32))?,
    )?;
    globals.set(
        "SysBitShiftRight",
        Function::new(ctx.clone(), |a: i32, n: i32| bits::shr(a, n as u32))?,
    )?;
    Ok(())
}

fn event_from(ctx: &Ctx<'_>, arena: &SharedArena, h: f64) -> rquickjs::Result<EventRecord> {
    let arena = arena.borrow();
    let bytes = arena.bytes(handle_arg(h)).map_err(|e| js_err(ctx, e))?;
    EventRecord::from_bytes(bytes).map_err(|e| js_err(ctx, e))
}

fn location_from(ctx: &Ctx<'_>, arena: &SharedArena, h: f64) -> rquickjs::Result<LocationRecord> {
    let record = event_from(ctx, arena, h)?;
    let found = record.discriminant();
    if found != kind::LOCATION {
        return Err(js_err(
            ctx,
            EventError::InvalidDiscriminant {
                expected: "location",
                found,
            },
        ));
    }
    let addr = record.data_addr();
    if addr.is_null() {
        return Err(js_err(ctx, "location event carries a null data address"));
    }
    // The native layer stored this address; following it is the same
    // trust boundary as handing out SysBufferGetBytePointer.
    Ok(unsafe { LocationRecord::from_addr(addr) })
}

fn register_events<'js>(
    ctx: &Ctx<'js>,
    globals: &Object<'js>,
    arena: &SharedArena,
) -> rquickjs::Result<()> {
    let a = arena.clone();
    globals.set(
        "SysEventCreate",
        Function::new(ctx.clone(), move |ctx: Ctx| -> rquickjs::Result<f64> {
            let handle = a
                .borrow_mut()
                .allocate(EventRecord::SIZE)
                .map_err(|e| js_err(&ctx, e))?;
            Ok(handle_bits(handle))
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysEventGetType",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<i32> {
            Ok(event_from(&ctx, &a, h)?.discriminant())
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysEventGetKey",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<i32> {
            event_from(&ctx, &a, h)?.key().map_err(|e| js_err(&ctx, e))
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysEventGetNativeKey",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<i32> {
            event_from(&ctx, &a, h)?
                .native_key()
                .map_err(|e| js_err(&ctx, e))
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysEventGetCharacter",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<u32> {
            event_from(&ctx, &a, h)?
                .character()
                .map_err(|e| js_err(&ctx, e))
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysEventGetX",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<i32> {
            event_from(&ctx, &a, h)?
                .pointer_x()
                .map_err(|e| js_err(&ctx, e))
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysEventGetY",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<i32> {
            event_from(&ctx, &a, h)?
                .pointer_y()
                .map_err(|e| js_err(&ctx, e))
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysEventGetTouchId",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<i32> {
            event_from(&ctx, &a, h)?
                .touch_id()
                .map_err(|e| js_err(&ctx, e))
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysEventGetState",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<i32> {
            event_from(&ctx, &a, h)?
                .touch_state()
                .map_err(|e| js_err(&ctx, e))
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysEventGetConnHandle",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<i32> {
            event_from(&ctx, &a, h)?
                .conn_handle()
                .map_err(|e| js_err(&ctx, e))
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysEventGetConnOpType",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<i32> {
            event_from(&ctx, &a, h)?
                .conn_op_type()
                .map_err(|e| js_err(&ctx, e))
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysEventGetConnResult",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<i32> {
            event_from(&ctx, &a, h)?
                .conn_result()
                .map_err(|e| js_err(&ctx, e))
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysEventGetTextBoxResult",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<i32> {
            event_from(&ctx, &a, h)?
                .textbox_result()
                .map_err(|e| js_err(&ctx, e))
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysEventGetTextBoxLength",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<i32> {
            event_from(&ctx, &a, h)?
                .textbox_length()
                .map_err(|e| js_err(&ctx, e))
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysEventGetData",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<f64> {
            Ok(event_from(&ctx, &a, h)?.data_addr().to_bits() as f64)
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysEventSensorGetType",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<i32> {
            event_from(&ctx, &a, h)?
                .sensor_type()
                .map_err(|e| js_err(&ctx, e))
        })?,
    )?;

    for (name, slot) in [
        ("SysEventSensorGetValue1", 0usize),
        ("SysEventSensorGetValue2", 1),
        ("SysEventSensorGetValue3", 2),
    ] {
        let a = arena.clone();
        globals.set(
            name,
            Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<f64> {
                let values = event_from(&ctx, &a, h)?
                    .sensor_values()
                    .map_err(|e| js_err(&ctx, e))?;
                Ok(values[slot] as f64)
            })?,
        )?;
    }

    let a = arena.clone();
    globals.set(
        "SysEventLocationGetState",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<i32> {
            Ok(location_from(&ctx, &a, h)?.state())
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysEventLocationGetLat",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<f64> {
            Ok(location_from(&ctx, &a, h)?.lat())
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysEventLocationGetLon",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<f64> {
            Ok(location_from(&ctx, &a, h)?.lon())
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysEventLocationGetHorzAcc",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<f64> {
            Ok(location_from(&ctx, &a, h)?.horz_acc())
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysEventLocationGetVertAcc",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<f64> {
            Ok(location_from(&ctx, &a, h)?.vert_acc())
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysEventLocationGetAlt",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<f64> {
            Ok(location_from(&ctx, &a, h)?.alt() as f64)
        })?,
    )?;

    Ok(())
}

fn widget_from(ctx: &Ctx<'_>, addr_bits: f64) -> rquickjs::Result<WidgetRecord> {
    let addr = RawAddr::from_bits(addr_bits as u64);
    if addr.is_null() {
        return Err(js_err(ctx, "widget record address is null"));
    }
    Ok(unsafe { WidgetRecord::from_addr(addr) })
}

fn register_widgets<'js>(ctx: &Ctx<'js>, globals: &Object<'js>) -> rquickjs::Result<()> {
    globals.set(
        "SysWidgetEventGetType",
        Function::new(ctx.clone(), |ctx: Ctx, addr: f64| -> rquickjs::Result<i32> {
            Ok(widget_from(&ctx, addr)?.event_type())
        })?,
    )?;

    globals.set(
        "SysWidgetEventGetHandle",
        Function::new(ctx.clone(), |ctx: Ctx, addr: f64| -> rquickjs::Result<i32> {
            Ok(widget_from(&ctx, addr)?.widget_handle())
        })?,
    )?;

    globals.set(
        "SysWidgetEventGetListItemIndex",
        Function::new(ctx.clone(), |ctx: Ctx, addr: f64| -> rquickjs::Result<i32> {
            widget_from(&ctx, addr)?
                .list_item_index()
                .map_err(|e| js_err(&ctx, e))
        })?,
    )?;

    globals.set(
        "SysWidgetEventGetChecked",
        Function::new(ctx.clone(), |ctx: Ctx, addr: f64| -> rquickjs::Result<i32> {
            let checked = widget_from(&ctx, addr)?
                .checked()
                .map_err(|e| js_err(&ctx, e))?;
            Ok(checked as i32)
        })?,
    )?;

    globals.set(
        "SysWidgetEventGetTabIndex",
        Function::new(ctx.clone(), |ctx: Ctx, addr: f64| -> rquickjs::Result<i32> {
            widget_from(&ctx, addr)?
                .tab_index()
                .map_err(|e| js_err(&ctx, e))
        })?,
    )?;

    globals.set(
        "SysWidgetEventGetUrlData",
        Function::new(ctx.clone(), |ctx: Ctx, addr: f64| -> rquickjs::Result<i32> {
            widget_from(&ctx, addr)?
                .url_data()
                .map_err(|e| js_err(&ctx, e))
        })?,
    )?;

    Ok(())
}

fn register_geometry<'js>(
    ctx: &Ctx<'js>,
    globals: &Object<'js>,
    arena: &SharedArena,
) -> rquickjs::Result<()> {
    let a = arena.clone();
    globals.set(
        "SysPointCreate",
        Function::new(ctx.clone(), move |ctx: Ctx| -> rquickjs::Result<f64> {
            let point = PointBox::new(&mut a.borrow_mut()).map_err(|e| js_err(&ctx, e))?;
            Ok(handle_bits(point.handle()))
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysPointGetX",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<i32> {
            PointBox::from_handle(handle_arg(h))
                .x(&a.borrow())
                .map_err(|e| js_err(&ctx, e))
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysPointGetY",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<i32> {
            PointBox::from_handle(handle_arg(h))
                .y(&a.borrow())
                .map_err(|e| js_err(&ctx, e))
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysPointSetX",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx, h: f64, x: i32| -> rquickjs::Result<()> {
                PointBox::from_handle(handle_arg(h))
                    .set_x(&mut a.borrow_mut(), x)
                    .map_err(|e| js_err(&ctx, e))
            },
        )?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysPointSetY",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx, h: f64, y: i32| -> rquickjs::Result<()> {
                PointBox::from_handle(handle_arg(h))
                    .set_y(&mut a.borrow_mut(), y)
                    .map_err(|e| js_err(&ctx, e))
            },
        )?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysRectCreate",
        Function::new(ctx.clone(), move |ctx: Ctx| -> rquickjs::Result<f64> {
            let rect = RectBox::new(&mut a.borrow_mut()).map_err(|e| js_err(&ctx, e))?;
            Ok(handle_bits(rect.handle()))
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysRectGetLeft",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<i32> {
            RectBox::from_handle(handle_arg(h))
                .left(&a.borrow())
                .map_err(|e| js_err(&ctx, e))
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysRectGetTop",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<i32> {
            RectBox::from_handle(handle_arg(h))
                .top(&a.borrow())
                .map_err(|e| js_err(&ctx, e))
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysRectGetWidth",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<i32> {
            RectBox::from_handle(handle_arg(h))
                .width(&a.borrow())
                .map_err(|e| js_err(&ctx, e))
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysRectGetHeight",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<i32> {
            RectBox::from_handle(handle_arg(h))
                .height(&a.borrow())
                .map_err(|e| js_err(&ctx, e))
        })?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysRectSetLeft",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx, h: f64, left: i32| -> rquickjs::Result<()> {
                RectBox::from_handle(handle_arg(h))
                    .set_left(&mut a.borrow_mut(), left)
                    .map_err(|e| js_err(&ctx, e))
            },
        )?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysRectSetTop",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx, h: f64, top: i32| -> rquickjs::Result<()> {
                RectBox::from_handle(handle_arg(h))
                    .set_top(&mut a.borrow_mut(), top)
                    .map_err(|e| js_err(&ctx, e))
            },
        )?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysRectSetWidth",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx, h: f64, width: i32| -> rquickjs::Result<()> {
                RectBox::from_handle(handle_arg(h))
                    .set_width(&mut a.borrow_mut(), width)
                    .map_err(|e| js_err(&ctx, e))
            },
        )?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysRectSetHeight",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx, h: f64, height: i32| -> rquickjs::Result<()> {
                RectBox::from_handle(handle_arg(h))
                    .set_height(&mut a.borrow_mut(), height)
                    .map_err(|e| js_err(&ctx, e))
            },
        )?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysCopyDataCreate",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx,
                  dst: i32,
                  dst_offset: i32,
                  src: i32,
                  src_offset: i32,
                  size: i32|
                  -> rquickjs::Result<f64> {
                let request = CopyDataRequest {
                    dst,
                    dst_offset,
                    src,
                    src_offset,
                    size,
                };
                let handle = request
                    .store(&mut a.borrow_mut())
                    .map_err(|e| js_err(&ctx, e))?;
                Ok(handle_bits(handle))
            },
        )?,
    )?;

    Ok(())
}

/// A wide-string handle, or an explicit JS `null` for a null input.
///
/// `Option`'s own conversion turns `None` into `undefined`; the boundary
/// contract for "no value" is `null`.
struct NullableHandle(Option<f64>);

impl<'js> IntoJs<'js> for NullableHandle {
    fn into_js(self, ctx: &Ctx<'js>) -> rquickjs::Result<Value<'js>> {
        match self.0 {
            Some(bits) => bits.into_js(ctx),
            None => Ok(Value::new_null(ctx.clone())),
        }
    }
}

fn register_strings<'js>(
    ctx: &Ctx<'js>,
    globals: &Object<'js>,
    arena: &SharedArena,
) -> rquickjs::Result<()> {
    let a = arena.clone();
    globals.set(
        "SysStringCharToWideChar",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx, text: Option<String>| -> rquickjs::Result<NullableHandle> {
                match text {
                    None => Ok(NullableHandle(None)),
                    Some(text) => {
                        let handle = narrow_to_wide(&mut a.borrow_mut(), text.as_bytes())
                            .map_err(|e| js_err(&ctx, e))?;
                        Ok(NullableHandle(Some(handle_bits(handle))))
                    }
                }
            },
        )?,
    )?;

    let a = arena.clone();
    globals.set(
        "SysStringWideCharToChar",
        Function::new(ctx.clone(), move |ctx: Ctx, h: f64| -> rquickjs::Result<String> {
            let bytes = wide_to_narrow(&a.borrow(), handle_arg(h)).map_err(|e| js_err(&ctx, e))?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        })?,
    )?;

    globals.set(
        "SysScreenSetColor",
        Function::new(ctx.clone(), |red: i32, green: i32, blue: i32| {
            pack_rgb(red, green, blue)
        })?,
    )?;

    Ok(())
}
