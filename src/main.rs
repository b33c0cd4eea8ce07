use std::cell::Cell;
use std::error::Error;
use std::fs;
use std::rc::Rc;

use serde::Deserialize;
use sh2_core::sh2dec::format_disas;
use sh2_core::{BreakEvent, SaturnBus, Sh2Bus, Sh2Config, Sh2Ctx, sh2_exec};

// Cycles per sh2_exec call
const SLICE: u32 = 448;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RunConfig {
    cpu: Sh2Config,
    cycles: Option<u64>,
    breakpoints: Vec<String>,
}

#[derive(Debug)]
struct Options {
    bios: Option<String>,
    program: Option<(String, u32)>,
    cycles: u64,
    config: RunConfig,
}

fn parse_hex(text: &str) -> Result<u32, Box<dyn Error>> {
    let digits = text.trim_start_matches("0x");
    u32::from_str_radix(digits, 16).map_err(|e| format!("bad address {:?}: {}", text, e).into())
}

fn usage() -> String {
    "usage: sh2run [--bios FILE] [--program FILE ADDR] [--cycles N] [--config FILE.json] \
     [--break ADDR]... [--instrument]"
        .to_string()
}

fn parse_args() -> Result<Options, Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let mut options = Options {
        bios: None,
        program: None,
        cycles: 1_000_000,
        config: RunConfig::default(),
    };
    let mut cycles = None;
    let mut instrument = false;
    let mut breakpoints = Vec::new();

    while let Some(arg) = args.next() {
        let mut value = || args.next().ok_or_else(usage);
        match arg.as_str() {
            "--bios" => options.bios = Some(value()?),
            "--program" | "--load" => {
                let path = value()?;
                let addr = parse_hex(&value()?)?;
                options.program = Some((path, addr));
            }
            "--cycles" => cycles = Some(value()?.parse()?),
            "--config" => {
                let text = fs::read_to_string(value()?)?;
                options.config = serde_json::from_str(&text)?;
            }
            "--break" => breakpoints.push(value()?),
            "--instrument" => instrument = true,
            "-h" | "--help" => return Err(usage().into()),
            _ => return Err(format!("unknown argument {:?}\n{}", arg, usage()).into()),
        }
    }

    // command line wins over the config file
    options.cycles = cycles.or(options.config.cycles).unwrap_or(options.cycles);
    options.config.breakpoints.extend(breakpoints);
    options.config.cpu.instrumentation |= instrument || !options.config.breakpoints.is_empty();
    Ok(options)
}

// Never zero while cycles remain
fn slice_len(remaining: u64) -> u32 {
    remaining.min(SLICE as u64) as u32
}

fn print_registers(ctx: &Sh2Ctx) {
    let regs = ctx.get_registers();
    for row in 0..4 {
        let line: Vec<String> = (0..4)
            .map(|col| {
                let n = row * 4 + col;
                format!("R{:<2}={:08X}", n, regs.r[n])
            })
            .collect();
        println!("{}", line.join("  "));
    }
    println!(
        "SR={:08X}  GBR={:08X}  VBR={:08X}  PR={:08X}",
        ctx.sr(),
        regs.gbr,
        regs.vbr,
        regs.pr
    );
    println!("MACH={:08X} MACL={:08X} PC={:08X}", regs.mach, regs.macl, regs.pc);
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = parse_args()?;
    let mut bus = SaturnBus::new();

    if let Some(path) = &options.bios {
        let data = fs::read(path).map_err(|e| format!("failed to load BIOS from {}: {}", path, e))?;
        bus.load_bios(&data);
        log::info!("Loaded BIOS {} ({} bytes)", path, data.len());
    }

    let mut ctx = Sh2Ctx::with_config(false, options.config.cpu);
    ctx.power_on(&mut bus);

    if let Some((path, addr)) = &options.program {
        let data = fs::read(path).map_err(|e| format!("failed to load {}: {}", path, e))?;
        bus.write_block(*addr, &data);
        ctx.set_pc(*addr);
        log::info!("Loaded {} at {:08X} ({} bytes)", path, addr, data.len());
    }

    for text in &options.config.breakpoints {
        ctx.add_code_breakpoint(parse_hex(text)?)?;
    }

    let stopped = Rc::new(Cell::new(false));
    if ctx.config.instrumentation {
        let flag = stopped.clone();
        ctx.set_breakpoint_callback(move |ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus, event: BreakEvent| {
            let pc = ctx.pc();
            log::info!("{:?}: {}", event, format_disas(pc, bus.fetch16(pc)));
            flag.set(true);
        });
        ctx.start_loop_tracking();
    }

    let mut total: u64 = 0;
    while total < options.cycles && !stopped.get() {
        let slice = slice_len(options.cycles - total);
        sh2_exec(&mut ctx, &mut bus, slice);
        total += slice as u64;
    }
    log::info!("Stopped after ~{} cycles", total);

    print_registers(&ctx);

    if ctx.config.instrumentation {
        let backtrace = ctx.backtrace();
        if !backtrace.is_empty() {
            println!("\nBacktrace:");
            for addr in backtrace.iter().rev() {
                println!("  {:08X}", addr);
            }
        }

        let mut hits = ctx.loop_hits();
        hits.sort_by(|a, b| b.1.cmp(&a.1));
        println!("\nHottest addresses:");
        for (addr, count) in hits.iter().take(16) {
            println!("  {:08X} {:>8}  {}", addr, count, format_disas(*addr, bus.fetch16(*addr)));
        }
    }

    Ok(())
}
