use abcgan::torch::constants::{
    DEFAULT_DRIVER_DIM, DEFAULT_ENCODER_D_OUT, DEFAULT_ENCODER_FF_DIM, DEFAULT_ENCODER_HEADS,
    DEFAULT_ENCODER_LAYERS, DEFAULT_ENCODER_MODEL_DIM, DEFAULT_FEATURE_DIM, DEFAULT_HEAD_LAYERS,
    DEFAULT_HIDDEN_DIM, DEFAULT_LATENT_DIM, DEFAULT_MAX_SEQ_LEN,
};
use abcgan::torch::mask::key_mask_from_lengths;
use abcgan::{AttentionEncoder, Critic, CriticConfig, EncoderConfig, Generator, GeneratorConfig};
use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use tch::{nn, Device, Kind, Tensor};
use tracing::info;

mod logging;

#[derive(Parser)]
#[command(name = "abcgan")]
#[command(about = "Sequence-conditioned GAN generator and critic", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Default tracing level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one forward pass through the generator and critic on random inputs
    Shapes {
        #[command(flatten)]
        model: ModelArgs,

        #[arg(short, long, default_value_t = 2)]
        batch: i64,

        #[arg(short, long, default_value_t = 3)]
        seq_len: i64,

        /// Real positions per batch row; the rest is masked as padding
        #[arg(long, value_delimiter = ',')]
        lengths: Option<Vec<i64>>,

        #[arg(long)]
        seed: Option<i64>,

        #[arg(long, default_value_t = false)]
        cpu: bool,
    },
    /// Print the generator, critic and encoder configuration as JSON
    Config {
        #[command(flatten)]
        model: ModelArgs,
    },
}

#[derive(Args, Clone)]
struct ModelArgs {
    #[arg(long, default_value_t = DEFAULT_HEAD_LAYERS)]
    layer_count: i64,

    #[arg(long, default_value_t = DEFAULT_LATENT_DIM)]
    latent_dim: i64,

    #[arg(long, default_value_t = DEFAULT_FEATURE_DIM)]
    feature_dim: i64,

    #[arg(long, default_value_t = DEFAULT_HIDDEN_DIM)]
    hidden_dim: i64,

    #[arg(long, default_value_t = DEFAULT_DRIVER_DIM)]
    driver_dim: i64,

    #[arg(long, default_value_t = DEFAULT_MAX_SEQ_LEN)]
    max_seq_len: i64,

    #[arg(long, default_value_t = DEFAULT_ENCODER_MODEL_DIM)]
    model_dim: i64,

    #[arg(long, default_value_t = DEFAULT_ENCODER_HEADS)]
    heads: i64,

    #[arg(long, default_value_t = DEFAULT_ENCODER_LAYERS)]
    encoder_layers: i64,

    #[arg(long, default_value_t = DEFAULT_ENCODER_FF_DIM)]
    ff_dim: i64,

    #[arg(long, default_value_t = DEFAULT_ENCODER_D_OUT)]
    d_out: i64,
}

#[derive(Serialize)]
struct ModelConfigs {
    generator: GeneratorConfig,
    critic: CriticConfig,
    encoder: EncoderConfig,
}

impl ModelArgs {
    fn configs(&self) -> anyhow::Result<ModelConfigs> {
        if self.layer_count < 1 {
            bail!("--layer-count must be at least 1");
        }
        if self.model_dim % self.heads != 0 {
            bail!("--model-dim must be divisible by --heads");
        }
        Ok(ModelConfigs {
            generator: GeneratorConfig {
                layer_count: self.layer_count,
                latent_dim: self.latent_dim,
                feature_dim: self.feature_dim,
                hidden_dim: self.hidden_dim,
            },
            critic: CriticConfig {
                layer_count: self.layer_count,
                feature_dim: self.feature_dim,
                hidden_dim: self.hidden_dim,
            },
            encoder: EncoderConfig {
                driver_dim: self.driver_dim,
                feature_dim: self.feature_dim,
                max_seq_len: self.max_seq_len,
                model_dim: self.model_dim,
                n_heads: self.heads,
                n_layers: self.encoder_layers,
                ff_dim: self.ff_dim,
                d_out: self.d_out,
            },
        })
    }
}

fn run_shapes(
    configs: &ModelConfigs,
    batch: i64,
    seq_len: i64,
    lengths: Option<&[i64]>,
    device: Device,
) -> anyhow::Result<()> {
    let vs = nn::VarStore::new(device);
    let root = vs.root();
    let generator = Generator::new(
        &(&root / "generator"),
        AttentionEncoder::new(&(&root / "generator_encoder"), configs.encoder),
        configs.generator,
    );
    let critic = Critic::new(
        &(&root / "critic"),
        AttentionEncoder::new(&(&root / "critic_encoder"), configs.encoder),
        configs.critic,
    );
    info!(
        parameters = vs.trainable_variables().len(),
        ?device,
        "built generator and critic"
    );

    let driver = Tensor::randn(
        [batch, configs.encoder.driver_dim],
        (Kind::Float, device),
    );
    let real = Tensor::randn(
        [batch, seq_len, configs.generator.feature_dim],
        (Kind::Float, device),
    );
    let mask = lengths
        .map(|lengths| key_mask_from_lengths(lengths, seq_len, device))
        .transpose()
        .context("invalid --lengths")?;

    let fake = generator
        .forward(&driver, &real, mask.as_ref(), None)
        .context("generator forward failed")?;
    let real_scores = critic
        .forward(&real, &driver, &real, mask.as_ref())
        .context("critic forward on real data failed")?;
    let fake_scores = critic
        .forward(&fake, &driver, &real, mask.as_ref())
        .context("critic forward on generated data failed")?;

    println!("{} {:?}", "driver:".bold(), driver.size());
    println!("{} {:?}", "sequence:".bold(), real.size());
    println!("{} {:?}", "generated:".bold(), fake.size());
    println!(
        "{} {:?} mean {:.4}",
        "real scores:".bold(),
        real_scores.size(),
        real_scores.mean(Kind::Float).double_value(&[])
    );
    println!(
        "{} {:?} mean {:.4}",
        "fake scores:".bold(),
        fake_scores.size(),
        fake_scores.mean(Kind::Float).double_value(&[])
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(&cli.log_level)?;

    println!("{}", "Start".green());

    match &cli.command {
        Some(Commands::Shapes {
            model,
            batch,
            seq_len,
            lengths,
            seed,
            cpu,
        }) => {
            let seed = seed.unwrap_or_else(rand::random);
            tch::manual_seed(seed);
            info!(seed, "seeded libtorch");
            let device = if *cpu {
                Device::Cpu
            } else {
                Device::cuda_if_available()
            };
            run_shapes(&model.configs()?, *batch, *seq_len, lengths.as_deref(), device)?;
        }
        Some(Commands::Config { model }) => {
            let configs = model.configs()?;
            println!("{}", serde_json::to_string_pretty(&configs)?);
        }
        None => {
            let defaults = ModelConfigs {
                generator: GeneratorConfig::default(),
                critic: CriticConfig::default(),
                encoder: EncoderConfig::default(),
            };
            println!("{}", serde_json::to_string_pretty(&defaults)?);
        }
    }

    println!("{}", "End".green());
    Ok(())
}
