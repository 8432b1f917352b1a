use colored::*;
use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::io::{self, Write};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("{}", "🔧 Maintenance Tracker Testing Tool".bright_blue().bold());
    println!("{}", "===================================".bright_blue());
    println!();

    let base_url = prompt("Base URL (vacío = http://localhost:3000): ")?;
    let base_url = if base_url.is_empty() {
        "http://localhost:3000".to_string()
    } else {
        base_url.trim_end_matches('/').to_string()
    };

    let api = Api {
        client: Client::new(),
        base_url,
        token: String::new(),
    };

    // Paso 1: credenciales y login
    let api = login(api).await?;

    // Paso 2: menú principal
    loop {
        println!();
        println!("{}", "📋 MENÚ PRINCIPAL".bright_green().bold());
        println!("{}", "==================".bright_green());
        println!("1. 🚗 Listar vehículos");
        println!("2. 🛠️ Registrar mantenimiento");
        println!("3. ⏰ Recordatorios próximos");
        println!("4. 🚪 Salir");

        match prompt("Selecciona una opción (1-4): ")?.as_str() {
            "1" => {
                api.call(Method::GET, "/api/vehicles", None).await?;
            }
            "2" => {
                create_record(&api).await?;
            }
            "3" => {
                api.call(Method::GET, "/api/maintenance/reminders/upcoming", None).await?;
            }
            "4" => {
                println!("{}", "👋 ¡Hasta luego!".bright_green());
                break;
            }
            _ => {
                println!("{}", "❌ Opción inválida. Intenta de nuevo.".bright_red());
            }
        }
    }

    Ok(())
}

struct Api {
    client: Client,
    base_url: String,
    token: String,
}

impl Api {
    /// Ejecuta la llamada, imprime la respuesta y devuelve el body
    async fn call(&self, method: Method, path: &str, body: Option<Value>) -> anyhow::Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        println!("{} {} {}", "📤".bright_blue(), method, url);

        let mut request = self.client.request(method, &url);
        if !self.token.is_empty() {
            request = request.bearer_auth(&self.token);
        }
        if let Some(body) = body {
            println!("{}", serde_json::to_string_pretty(&body)?);
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));

        let label = format!("📥 {}", status);
        if status.is_success() {
            println!("{}", label.bright_green().bold());
        } else {
            println!("{}", label.bright_red().bold());
        }
        println!("{}", serde_json::to_string_pretty(&body)?);

        Ok(body)
    }
}

async fn login(mut api: Api) -> anyhow::Result<Api> {
    println!("{}", "🔐 CREDENCIALES".bright_cyan().bold());
    println!("{}", "===============".bright_cyan());

    let email = prompt("Email: ")?;
    let password = prompt("Password: ")?;

    let body = api
        .call(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": email, "password": password })),
        )
        .await?;

    let token = body["access"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("❌ No se pudo extraer el access token de la respuesta"))?;

    println!("{}", "✅ Login correcto".bright_green().bold());
    api.token = token.to_string();
    Ok(api)
}

async fn create_record(api: &Api) -> anyhow::Result<()> {
    println!();
    println!("{}", "🛠️ NUEVO REGISTRO".bright_cyan().bold());
    println!("{}", "==================".bright_cyan());

    let vehicle_id = prompt("Vehicle id: ")?;
    let type_id = prompt("Maintenance type id: ")?;
    let date = prompt("Fecha (YYYY-MM-DD): ")?;
    let mileage: i64 = prompt("Kilometraje: ")?.parse().unwrap_or(0);
    let next_due = prompt("Próxima fecha (vacío = ninguna): ")?;

    let payload = json!({
        "vehicle_id": vehicle_id,
        "maintenance_type_id": type_id,
        "date_performed": date,
        "mileage_at_service": mileage,
        "next_due_date": if next_due.is_empty() { Value::Null } else { Value::String(next_due) },
    });

    let body = api.call(Method::POST, "/api/maintenance/records", Some(payload)).await?;

    if let Some(reminders) = body["data"]["reminders"].as_array() {
        println!(
            "{}",
            format!("⏰ Recordatorios del registro: {}", reminders.len()).bright_green().bold()
        );
    }

    Ok(())
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{}", label.bright_yellow());
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}
