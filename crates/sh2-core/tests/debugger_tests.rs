use std::cell::RefCell;
use std::rc::Rc;

use sh2_core::{BreakEvent, MemBreakFlags, Sh2Bus, Sh2Ctx, Sh2Error, StepMode, sh2mem};

mod test_bus;
use test_bus::*;

type EventLog = Rc<RefCell<Vec<BreakEvent>>>;

fn event_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

#[test]
fn test_code_breakpoint() {
    let (mut ctx, mut bus) = setup_instrumented(&[NOP, NOP, 0xE101, 0xE202]);
    ctx.add_code_breakpoint(PROGRAM + 4).unwrap();

    let events = event_log();
    let log = events.clone();
    ctx.set_breakpoint_callback(move |ctx, _bus, event| {
        assert!(ctx.in_breakpoint());
        // skip the mov #1,r1
        ctx.regs.pc += 2;
        log.borrow_mut().push(event);
    });

    run_n(&mut ctx, &mut bus, 3);
    assert_eq!(
        *events.borrow(),
        vec![BreakEvent::CodeBreakpoint { pc: PROGRAM + 4 }]
    );
    assert!(!ctx.in_breakpoint());
    assert_eq!(ctx.regs.r[1], 0);
    assert_eq!(ctx.regs.r[2], 2);
}

#[test]
fn test_code_breakpoint_table() {
    let mut ctx = Sh2Ctx::new(false);
    for i in 0..10 {
        ctx.add_code_breakpoint(0x0600_0000 + i * 2).unwrap();
    }

    assert!(matches!(
        ctx.add_code_breakpoint(0x0600_0000),
        Err(Sh2Error::DuplicateBreakpoint(0x0600_0000))
    ));
    assert!(matches!(
        ctx.add_code_breakpoint(0x0700_0000),
        Err(Sh2Error::BreakpointTableFull)
    ));
    assert!(matches!(
        ctx.del_code_breakpoint(0x0700_0000),
        Err(Sh2Error::BreakpointNotFound(0x0700_0000))
    ));

    ctx.del_code_breakpoint(0x0600_0004).unwrap();
    assert_eq!(ctx.code_breakpoints().len(), 9);
    assert!(!ctx.code_breakpoints().contains(&0x0600_0004));

    ctx.clear_code_breakpoints();
    assert!(ctx.code_breakpoints().is_empty());
}

#[test]
fn test_breakpoint_on_delay_slot() {
    let (mut ctx, mut bus) = setup_instrumented(&[0xA001, 0xE105, NOP, NOP]);
    ctx.add_code_breakpoint(PROGRAM + 2).unwrap();

    let events = event_log();
    let log = events.clone();
    ctx.set_breakpoint_callback(move |ctx, _bus, event| {
        // delivered once the branch has completed
        assert_eq!(ctx.regs.pc, PROGRAM + 6);
        assert_eq!(ctx.regs.r[1], 5);
        log.borrow_mut().push(event);
    });

    run_one(&mut ctx, &mut bus);
    assert_eq!(
        *events.borrow(),
        vec![BreakEvent::CodeBreakpoint { pc: PROGRAM + 2 }]
    );
}

#[test]
fn test_memory_breakpoints() {
    // no instrumentation needed for the memory overlay
    let (mut ctx, mut bus) = setup(&[
        0x2212, // mov.l r1,@r2
        0x6322, // mov.l @r2,r3
        0x6541, // mov.w @r4,r5
    ]);
    ctx.regs.r[1] = 0x1234_5678;
    ctx.regs.r[2] = 0x2000_0000 | DATA;
    ctx.regs.r[4] = DATA + 0x10;
    ctx.add_memory_breakpoint(DATA, MemBreakFlags::WRITE32).unwrap();
    ctx.add_memory_breakpoint(DATA + 0x10, MemBreakFlags::READ).unwrap();
    bus.write16(DATA + 0x10, 0x8001);

    let events = event_log();
    let log = events.clone();
    ctx.set_breakpoint_callback(move |ctx, bus, event| {
        // accesses made from the callback do not re-trigger
        sh2mem::read_mem16(ctx, bus, DATA + 0x10);
        log.borrow_mut().push(event);
    });

    run_n(&mut ctx, &mut bus, 3);
    assert_eq!(bus.read32(DATA), 0x1234_5678);
    assert_eq!(
        *events.borrow(),
        vec![
            BreakEvent::MemoryBreakpoint {
                addr: 0x2000_0000 | DATA,
                access: MemBreakFlags::WRITE32
            },
            BreakEvent::MemoryBreakpoint {
                addr: DATA + 0x10,
                access: MemBreakFlags::READ16
            },
        ]
    );

    assert_eq!(ctx.regs.r[5], 0xFFFF_8001);

    ctx.del_memory_breakpoint(0xA000_0000 | DATA).unwrap();
    assert_eq!(ctx.memory_breakpoints().len(), 1);
    ctx.clear_memory_breakpoints();
    assert!(ctx.memory_breakpoints().is_empty());

    // the same accesses again behave as if never watched
    ctx.regs.pc = PROGRAM;
    ctx.regs.r[1] = 0x9ABC_DEF0;
    run_n(&mut ctx, &mut bus, 3);
    assert_eq!(bus.read32(DATA), 0x9ABC_DEF0);
    assert_eq!(ctx.regs.r[3], 0x9ABC_DEF0);
    assert_eq!(ctx.regs.r[5], 0xFFFF_8001);
    assert_eq!(events.borrow().len(), 2);
}

#[test]
fn test_forced_break() {
    let (mut ctx, mut bus) = setup(&[NOP, NOP]);
    let events = event_log();
    let log = events.clone();
    ctx.set_breakpoint_callback(move |_ctx, _bus, event| log.borrow_mut().push(event));

    ctx.request_break();
    run_n(&mut ctx, &mut bus, 2);
    assert_eq!(*events.borrow(), vec![BreakEvent::Forced { pc: PROGRAM + 2 }]);

    // no callback installed, nothing is delivered
    ctx.clear_breakpoint_callback();
    ctx.request_break();
    run_one(&mut ctx, &mut bus);
    assert_eq!(events.borrow().len(), 1);
}

#[test]
fn test_step_over_call() {
    let (mut ctx, mut bus) = setup_instrumented(&[
        0xB003, // bsr +3
        NOP,
        0xE101, // mov #1,r1
        NOP,
        NOP,
        0x000B, // rts
        NOP,
    ]);

    let events = event_log();
    let log = events.clone();
    let armed = ctx
        .step_over(&mut bus, move |_ctx, _bus, event| log.borrow_mut().push(event))
        .unwrap();
    assert!(armed);
    assert_eq!(ctx.armed_step(), Some(StepMode::Over { depth: 0 }));

    run_one(&mut ctx, &mut bus);
    assert!(events.borrow().is_empty());
    assert_eq!(ctx.backtrace(), &[PROGRAM]);
    assert_eq!(ctx.armed_step(), Some(StepMode::Over { depth: 1 }));

    run_one(&mut ctx, &mut bus);
    assert_eq!(*events.borrow(), vec![BreakEvent::StepOver { pc: PROGRAM + 4 }]);
    assert_eq!(ctx.armed_step(), None);
    assert!(ctx.backtrace().is_empty());
}

#[test]
fn test_step_over_plain_instruction() {
    let (mut ctx, mut bus) = setup_instrumented(&[0xE101, NOP]);
    let armed = ctx.step_over(&mut bus, |_ctx, _bus, _event| {}).unwrap();
    assert!(!armed);
    assert_eq!(ctx.regs.r[1], 1);
    assert_eq!(ctx.regs.pc, PROGRAM + 2);
    assert_eq!(ctx.armed_step(), None);
}

#[test]
fn test_step_requests_need_instrumentation() {
    let (mut ctx, mut bus) = setup(&[0xB003, NOP]);
    assert!(matches!(
        ctx.step_over(&mut bus, |_ctx, _bus, _event| {}),
        Err(Sh2Error::InstrumentationDisabled)
    ));
    assert!(matches!(
        ctx.step_out(|_ctx, _bus, _event| {}),
        Err(Sh2Error::InstrumentationDisabled)
    ));
    assert_eq!(ctx.regs.pc, PROGRAM);
}

#[test]
fn test_step_out() {
    let (mut ctx, mut bus) = setup_instrumented(&[NOP, NOP, 0xE101]);
    load_program(&mut bus, PROGRAM + 0x20, &[NOP, 0x000B, NOP]);
    ctx.regs.pc = PROGRAM + 0x20;
    ctx.regs.pr = PROGRAM + 4;

    let events = event_log();
    let log = events.clone();
    ctx.step_out(move |_ctx, _bus, event| log.borrow_mut().push(event))
        .unwrap();
    assert!(matches!(
        ctx.step_out(|_ctx, _bus, _event| {}),
        Err(Sh2Error::StepAlreadyArmed)
    ));

    run_one(&mut ctx, &mut bus);
    assert!(events.borrow().is_empty());
    run_one(&mut ctx, &mut bus);
    assert_eq!(*events.borrow(), vec![BreakEvent::StepOut { pc: PROGRAM + 4 }]);
    assert_eq!(ctx.armed_step(), None);
}

#[test]
fn test_step_out_of_non_leaf_function() {
    let (mut ctx, mut bus) = setup_instrumented(&[
        0xB006, // bsr f
        NOP,
        0xE101, // mov #1,r1
        NOP,
    ]);
    // f
    load_program(
        &mut bus,
        PROGRAM + 0x10,
        &[
            0x4F22, // sts.l pr,@-r15
            0xB005, // bsr g
            NOP,
            0xB003, // bsr g
            NOP,
            0x4F26, // lds.l @r15+,pr
            0x000B, // rts
            NOP,
        ],
    );
    // g
    load_program(&mut bus, PROGRAM + 0x20, &[0x000B, NOP]);

    // into f, then through the first call to g
    run_n(&mut ctx, &mut bus, 4);
    assert_eq!(ctx.regs.pc, PROGRAM + 0x16);
    assert_eq!(ctx.regs.pr, PROGRAM + 0x16);

    let events = event_log();
    let log = events.clone();
    ctx.step_out(move |_ctx, _bus, event| log.borrow_mut().push(event))
        .unwrap();
    assert_eq!(ctx.armed_step(), Some(StepMode::Out { depth: 0 }));

    run_one(&mut ctx, &mut bus);
    assert_eq!(ctx.armed_step(), Some(StepMode::Out { depth: 1 }));

    // back in f with PC == PR, still one level down
    run_one(&mut ctx, &mut bus);
    assert_eq!(ctx.regs.pc, PROGRAM + 0x1A);
    assert_eq!(ctx.regs.pr, PROGRAM + 0x1A);
    assert!(events.borrow().is_empty());

    run_one(&mut ctx, &mut bus);
    assert_eq!(ctx.regs.pr, PROGRAM + 4);
    assert!(events.borrow().is_empty());

    run_one(&mut ctx, &mut bus);
    assert_eq!(*events.borrow(), vec![BreakEvent::StepOut { pc: PROGRAM + 4 }]);
    assert_eq!(ctx.armed_step(), None);
    assert_eq!(ctx.regs.r[15], STACK);

    run_one(&mut ctx, &mut bus);
    assert_eq!(ctx.regs.r[1], 1);
    assert_eq!(events.borrow().len(), 1);
}

#[test]
fn test_cancel_step() {
    let (mut ctx, _bus) = setup_instrumented(&[NOP]);
    assert!(!ctx.cancel_step());
    ctx.step_out(|_ctx, _bus, _event| {}).unwrap();
    assert!(ctx.cancel_step());
    assert_eq!(ctx.armed_step(), None);

    // reset disarms too, breakpoints survive
    ctx.add_code_breakpoint(PROGRAM).unwrap();
    ctx.step_out(|_ctx, _bus, _event| {}).unwrap();
    ctx.reset();
    assert_eq!(ctx.armed_step(), None);
    assert_eq!(ctx.code_breakpoints(), &[PROGRAM]);
}

#[test]
fn test_loop_tracking() {
    let (mut ctx, mut bus) = setup_instrumented(&[
        0xE103, // mov #3,r1
        0x4110, // dt r1
        0x8BFD, // bf -3
        NOP,
        NOP,
    ]);
    assert!(!ctx.loop_tracking_enabled());
    ctx.start_loop_tracking();

    run_n(&mut ctx, &mut bus, 8);
    assert_eq!(
        ctx.loop_hits(),
        vec![
            (PROGRAM + 2, 3),
            (PROGRAM + 4, 3),
            (PROGRAM, 1),
            (PROGRAM + 6, 1)
        ]
    );

    ctx.stop_loop_tracking();
    run_one(&mut ctx, &mut bus);
    assert_eq!(ctx.loop_hits().len(), 4);

    ctx.clear_loop_tracking();
    assert!(ctx.loop_hits().is_empty());
}
