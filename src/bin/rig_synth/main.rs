//! 命令行：读取骨架与选项 JSON，生成刚体与关节并写出记录

mod input;

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use input::RigInput;
use softbody_rig::synth::{apply_all, assemble_full_rig, create_bodies, fix_constraint_scale};
use softbody_rig::RigRecords;

#[derive(Parser, Debug)]
#[command(name = "rig_synth", version, about = "Synthesize soft-body bodies and constraints from bone names")]
struct Opts {
    /// 输入 JSON（骨骼、顶点簇、已有记录、选项）
    input: PathBuf,

    /// 输出路径（默认 <input_stem>.rig.json）
    #[arg(long)]
    out: Option<PathBuf>,

    /// 格式化输出
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opt = Opts::parse();

    let s = fs::read_to_string(&opt.input)
        .with_context(|| format!("reading {}", opt.input.display()))?;
    let mut input: RigInput = serde_json::from_str(&s).context("parsing rig input")?;
    let mut ctx = input.build_context()?;

    let fixed = fix_constraint_scale(&mut ctx.physics);
    if fixed > 0 {
        log::info!("已重置 {} 个关节参考帧缩放", fixed);
    }

    if !input.body_params.is_empty() {
        create_bodies(&mut ctx, &input.body_params);
    }
    let mut report = assemble_full_rig(&mut ctx, &input.options);
    report.merge(apply_all(&mut ctx, &input.constraints));

    for (name, reason) in &report.failed {
        log::warn!("{}: {}", name, reason);
    }

    let out = match &opt.out {
        Some(p) => p.clone(),
        None => {
            let stem = opt
                .input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "rig".to_string());
            opt.input.with_file_name(format!("{stem}.rig.json"))
        }
    };

    let records = RigRecords::from_rig(&ctx.physics)?;
    let json = if opt.pretty {
        serde_json::to_string_pretty(&records)?
    } else {
        serde_json::to_string(&records)?
    };
    fs::write(&out, json).with_context(|| format!("writing {}", out.display()))?;

    println!(
        "Rig: {} ({} bodies, {} constraints, {} failed)",
        out.display(),
        records.bodies.len(),
        records.constraints.len(),
        report.failed.len()
    );
    Ok(())
}
