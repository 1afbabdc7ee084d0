use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use cnpj_consulta::classificacao;
use cnpj_consulta::contexto::ContextoConsulta;
use cnpj_consulta::exportacao::{self, Formato, Layout};
use cnpj_consulta::registro::{
    ClienteRegistro, ConfigRegistro, ErroConsulta, URL_API_PADRAO, TIMEOUT_PADRAO_SEGS,
};
use cnpj_consulta::render::{self, OpcoesExibicao};
use cnpj_consulta::{api, ui, utils};

#[derive(Parser)]
#[command(name = "cnpj-consulta")]
#[command(about = "Consulta de CNPJ com classificação setorial pela CNAE principal", long_about = None)]
struct Cli {
    /// Modo silencioso (menos saída)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Modo verboso (mais detalhes)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct BaseArgs {
    /// URL base da API de CNPJ
    #[arg(long, env = "CNPJ_API_URL", default_value = URL_API_PADRAO)]
    api_url: String,

    /// Tempo máximo de espera pela resposta, em segundos
    #[arg(long, env = "CNPJ_TIMEOUT", default_value_t = TIMEOUT_PADRAO_SEGS)]
    timeout: u64,
}

impl BaseArgs {
    fn cliente(&self) -> Result<ClienteRegistro> {
        Ok(ClienteRegistro::new(ConfigRegistro {
            url_base: self.api_url.clone(),
            timeout: Duration::from_secs(self.timeout),
        })?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Consulta um CNPJ, classifica a empresa e exibe o cadastro
    Consultar {
        /// CNPJ com ou sem pontuação (ex.: 31.952.078/0001-30)
        cnpj: String,
        /// Exporta o resultado (pode repetir: --exportar csv --exportar xlsx)
        #[arg(short, long, value_enum)]
        exportar: Vec<Formato>,
        /// Colunas da exportação
        #[arg(short, long, value_enum, default_value_t = Layout::Completo)]
        layout: Layout,
        /// Pasta onde os arquivos exportados são gravados
        #[arg(short, long, default_value = ".")]
        saida: PathBuf,
        /// Lista sócios e atividades secundárias
        #[arg(short, long)]
        detalhes: bool,
        /// Exibe o JSON completo do registro
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        base: BaseArgs,
    },
    /// Classifica um código CNAE sem consultar a base
    Classificar {
        /// Código CNAE (ex.: 5611201)
        cnae: String,
    },
    /// Lista as regras de classificação na ordem de avaliação
    Regras,
    /// Inicia servidor web API para consulta de CNPJ
    Server {
        /// Porta do servidor
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Endereço do servidor
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[command(flatten)]
        base: BaseArgs,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    ui::init(cli.quiet, cli.verbose);
    init_tracing(cli.verbose);

    match executar(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::print_error(&mensagem_de_erro(&e));
            ExitCode::FAILURE
        }
    }
}

async fn executar(command: Commands) -> Result<()> {
    match command {
        Commands::Consultar { cnpj, exportar, layout, saida, detalhes, json, base } => {
            let opcoes = OpcoesExibicao { detalhes, json };
            consultar(&cnpj, &exportar, layout, &saida, opcoes, &base).await?;
        }
        Commands::Classificar { cnae } => {
            let c = classificacao::classificar(&utils::somente_digitos(&cnae));
            if c.prioritaria {
                ui::print_warning(&format!("🌟 GRUPO IDENTIFICADO: {}", c.grupo));
                println!("👉 {} {}", "Atenção:".bold(), c.instrucao.bold());
            } else {
                println!("🔍 Grupo: {}", c.grupo.bold());
                println!("{}", c.instrucao.italic());
            }
        }
        Commands::Regras => {
            ui::print_header("Regras de classificação (primeira que casar vence)");
            for (i, regra) in classificacao::regras().iter().enumerate() {
                let marca = if regra.prioritaria { " ★".yellow().to_string() } else { String::new() };
                println!("{:>3}. {:<32} {}{}", i + 1, regra.criterio.to_string(), regra.grupo.bold(), marca);
                ui::print_verbose(regra.instrucao);
            }
            println!(
                "{:>3}. {:<32} {}",
                "-",
                "nenhuma regra casou",
                classificacao::GRUPO_PADRAO.bold()
            );
        }
        Commands::Server { port, host, base } => {
            api::start_server(base.cliente()?, &host, port).await?;
        }
    }

    Ok(())
}

async fn consultar(
    entrada: &str,
    exportar: &[Formato],
    layout: Layout,
    saida: &std::path::Path,
    opcoes: OpcoesExibicao,
    base: &BaseArgs,
) -> Result<()> {
    let cnpj = utils::somente_digitos(entrada);
    if cnpj.is_empty() {
        return Err(ErroConsulta::EntradaVazia.into());
    }
    if !utils::cnpj_valido(&cnpj) {
        ui::print_warning(&format!(
            "O CNPJ {} não parece válido (14 dígitos e dígitos verificadores). Consultando assim mesmo.",
            cnpj
        ));
    }

    let cliente = base.cliente()?;
    ui::print_verbose(&format!("URL: {}", cliente.url_para(&cnpj)));

    let pb = ui::spinner("Consultando base de dados...");
    let resultado = ContextoConsulta::consultar(&cliente, &cnpj).await;
    pb.finish_and_clear();

    let ctx = resultado?;

    if !ui::is_quiet() {
        ui::print_header(&format!("Consulta de CNPJ {}", utils::formatar_cnpj(&ctx.cnpj)));
        render::relatorio(&mut io::stdout().lock(), &ctx, opcoes)?;
        ui::print_separator();
    }
    ui::print_verbose(&format!("Empresa localizada em {}", render::local(&ctx)));

    for formato in exportar {
        let caminho = exportacao::salvar(&ctx, *formato, layout, saida)?;
        ui::print_success(&format!("Arquivo gerado: {}", caminho.display()));
    }

    Ok(())
}

/// Erros da consulta já trazem o texto para o usuário; os demais levam a cadeia de causas.
fn mensagem_de_erro(erro: &anyhow::Error) -> String {
    match erro.downcast_ref::<ErroConsulta>() {
        Some(e) => e.to_string(),
        None => format!("{:#}", erro),
    }
}

fn init_tracing(verbose: bool) {
    let padrao = if verbose { "cnpj_consulta=debug" } else { "warn" };
    let filtro = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(padrao));
    tracing_subscriber::fmt()
        .with_env_filter(filtro)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
