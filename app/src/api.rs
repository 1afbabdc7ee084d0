use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse, Result as ActixResult};
use anyhow::Context;
use clap::ValueEnum;
use serde::Deserialize;
use tracing::{error, info};

use crate::contexto::ContextoConsulta;
use crate::exportacao::{self, Formato, Layout};
use crate::registro::{ClienteRegistro, ErroConsulta};
use crate::ui;
use crate::utils;

pub struct AppState {
    pub cliente: ClienteRegistro,
}

#[derive(Debug, Deserialize)]
pub struct ParametrosExportacao {
    #[serde(default)]
    pub layout: Layout,
}

pub async fn consultar_cnpj(
    cnpj: web::Path<String>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let cnpj_limpo = utils::somente_digitos(&cnpj);

    match ContextoConsulta::consultar(&state.cliente, &cnpj_limpo).await {
        Ok(ctx) => {
            info!(cnpj = %ctx.cnpj, grupo = %ctx.classificacao.grupo, "consulta concluída");
            Ok(HttpResponse::Ok().json(ctx))
        }
        Err(e) => Ok(resposta_de_erro(&cnpj_limpo, &e)),
    }
}

pub async fn exportar_cnpj(
    caminho: web::Path<(String, String)>,
    parametros: web::Query<ParametrosExportacao>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let (cnpj, formato) = caminho.into_inner();
    let cnpj_limpo = utils::somente_digitos(&cnpj);

    let Ok(formato) = Formato::from_str(&formato, true) else {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "erro": format!("Formato desconhecido: {}", formato),
            "formatos": ["csv", "xlsx", "json"]
        })));
    };

    let ctx = match ContextoConsulta::consultar(&state.cliente, &cnpj_limpo).await {
        Ok(ctx) => ctx,
        Err(e) => return Ok(resposta_de_erro(&cnpj_limpo, &e)),
    };

    let conteudo = exportacao::gerar(&ctx, formato, parametros.layout).map_err(|e| {
        error!(cnpj = %ctx.cnpj, "falha ao gerar exportação: {:#}", e);
        actix_web::error::ErrorInternalServerError(format!("Erro ao gerar arquivo: {}", e))
    })?;

    Ok(HttpResponse::Ok()
        .content_type(formato.content_type())
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(exportacao::nome_arquivo(
                &ctx.cnpj, formato,
            ))],
        })
        .body(conteudo))
}

fn resposta_de_erro(cnpj: &str, erro: &ErroConsulta) -> HttpResponse {
    let corpo = serde_json::json!({
        "erro": erro.to_string(),
        "cnpj": cnpj,
    });
    match erro {
        ErroConsulta::EntradaVazia => HttpResponse::BadRequest().json(corpo),
        ErroConsulta::NaoEncontrado { .. } => HttpResponse::NotFound().json(corpo),
        ErroConsulta::TempoEsgotado { .. } => HttpResponse::GatewayTimeout().json(corpo),
        ErroConsulta::ErroUpstream { .. }
        | ErroConsulta::Transporte(_)
        | ErroConsulta::RespostaInvalida(_) => {
            error!(cnpj, "falha na consulta: {}", erro);
            HttpResponse::BadGateway().json(corpo)
        }
    }
}

async fn health_check() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "mensagem": "API de consulta CNPJ está funcionando"
    })))
}

pub fn configurar(cfg: &mut web::ServiceConfig) {
    cfg.route("/cnpj/{cnpj}", web::get().to(consultar_cnpj))
        .route("/cnpj/{cnpj}/{formato}", web::get().to(exportar_cnpj))
        .route("/health", web::get().to(health_check));
}

pub async fn start_server(cliente: ClienteRegistro, host: &str, port: u16) -> anyhow::Result<()> {
    let address = format!("{}:{}", host, port);
    let url_base = cliente.config().url_base.clone();
    let app_state = web::Data::new(AppState { cliente });

    ui::print_header("🌐 Servidor de consulta CNPJ");
    ui::print_success(&format!("Servidor iniciando em http://{}", address));
    ui::print_info(&format!("Base consultada: {}", url_base));
    ui::print_info("Endpoints disponíveis:");
    use colored::Colorize;
    println!("  {} GET /cnpj/{{cnpj}}            - Consulta e classifica um CNPJ", "•".cyan());
    println!("  {} GET /cnpj/{{cnpj}}/{{formato}}  - Baixa csv, xlsx ou json (?layout=resumo)", "•".cyan());
    println!("  {} GET /health                   - Verifica status do servidor", "•".cyan());
    ui::print_verbose(&format!("Exemplo: curl http://{}/cnpj/31952078000130", address));
    ui::print_separator();

    actix_web::HttpServer::new(move || {
        actix_web::App::new()
            .app_data(app_state.clone())
            .configure(configurar)
    })
    .bind(&address)
    .with_context(|| format!("Falha ao abrir o endereço {}", address))?
    .workers(num_cpus::get())
    .run()
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registro::ConfigRegistro;
    use actix_web::{http::StatusCode, test, App};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn estado(url: &str) -> web::Data<AppState> {
        let cliente = ClienteRegistro::new(ConfigRegistro {
            url_base: url.to_string(),
            ..ConfigRegistro::default()
        })
        .unwrap();
        web::Data::new(AppState { cliente })
    }

    fn corpo_registro() -> serde_json::Value {
        serde_json::json!({
            "taxId": "31952078000130",
            "company": { "name": "HOTEL TESTE LTDA" },
            "mainActivity": { "id": 5510801, "text": "Hotéis" }
        })
    }

    #[actix_web::test]
    async fn health_responde_ok() {
        let app = test::init_service(App::new().app_data(estado("http://127.0.0.1:9")).configure(configurar)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn consulta_devolve_classificacao() {
        let servidor = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/office/31952078000130"))
            .respond_with(ResponseTemplate::new(200).set_body_json(corpo_registro()))
            .mount(&servidor)
            .await;

        let url = format!("{}/office", servidor.uri());
        let app = test::init_service(App::new().app_data(estado(&url)).configure(configurar)).await;
        let req = test::TestRequest::get().uri("/cnpj/31.952.078.0001-30").to_request();
        let corpo: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(corpo["cnpj"], "31952078000130");
        assert_eq!(corpo["classificacao"]["grupo"], "HOSPITALIDADE");
        assert_eq!(corpo["classificacao"]["prioritaria"], true);
        assert_eq!(corpo["registro"]["company"]["name"], "HOTEL TESTE LTDA");
    }

    #[actix_web::test]
    async fn cnpj_inexistente_vira_404() {
        let servidor = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&servidor)
            .await;

        let app = test::init_service(App::new().app_data(estado(&servidor.uri())).configure(configurar)).await;
        let req = test::TestRequest::get().uri("/cnpj/00000000000000").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn erro_da_base_vira_502() {
        let servidor = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&servidor)
            .await;

        let app = test::init_service(App::new().app_data(estado(&servidor.uri())).configure(configurar)).await;
        let req = test::TestRequest::get().uri("/cnpj/31952078000130").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[actix_web::test]
    async fn exporta_csv_como_anexo() {
        let servidor = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/31952078000130"))
            .respond_with(ResponseTemplate::new(200).set_body_json(corpo_registro()))
            .mount(&servidor)
            .await;

        let app = test::init_service(App::new().app_data(estado(&servidor.uri())).configure(configurar)).await;
        let req = test::TestRequest::get()
            .uri("/cnpj/31952078000130/csv?layout=resumo")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let disposicao = resp
            .headers()
            .get("content-disposition")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(disposicao.contains("cnpj_31952078000130.csv"));

        let corpo = test::read_body(resp).await;
        let texto = String::from_utf8(corpo.to_vec()).unwrap();
        assert!(texto.contains("31952078000130,HOTEL TESTE LTDA,HOSPITALIDADE"));
    }

    #[actix_web::test]
    async fn formato_desconhecido_vira_400() {
        let app = test::init_service(App::new().app_data(estado("http://127.0.0.1:9")).configure(configurar)).await;
        let req = test::TestRequest::get().uri("/cnpj/31952078000130/pdf").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
