use chrono::NaiveDate;
use clap::{Arg, ArgMatches, Command, value_parser};

use taskdeck::error::ClientError;
use taskdeck::models::{Category, FieldErrors, Priority, ProfileUpdate, TaskRow, TaskStatus, datetime};
use taskdeck::views::{CategoryForm, CreateOutcome, NavigationList, PasswordChange, TaskEditor};
use taskdeck::AppContext;

pub fn command() -> Command {
    Command::new("taskdeck")
        .about("Categories and tasks from the command line")
        .subcommand_required(true)
        .subcommand(
            Command::new("signup")
                .arg(Arg::new("username").long("username").required(true))
                .arg(Arg::new("email").long("email").required(true))
                .arg(Arg::new("password").long("password").required(true)),
        )
        .subcommand(
            Command::new("login")
                .arg(Arg::new("username").required(true))
                .arg(Arg::new("password").required(true)),
        )
        .subcommand(Command::new("logout"))
        .subcommand(Command::new("whoami"))
        .subcommand(
            Command::new("sidebar").arg(
                Arg::new("fixed")
                    .long("fixed")
                    .required(true)
                    .value_parser(value_parser!(bool)),
            ),
        )
        .subcommand(
            Command::new("categories")
                .subcommand_required(true)
                .subcommand(Command::new("list"))
                .subcommand(Command::new("add").arg(Arg::new("name").required(true)))
                .subcommand(
                    Command::new("rename")
                        .arg(Arg::new("id").required(true).value_parser(value_parser!(i64)))
                        .arg(Arg::new("name").required(true)),
                )
                .subcommand(
                    Command::new("delete")
                        .arg(Arg::new("id").required(true).value_parser(value_parser!(i64))),
                ),
        )
        .subcommand(
            Command::new("tasks")
                .subcommand_required(true)
                .subcommand(Command::new("list").arg(category_arg()))
                .subcommand(task_fields(Command::new("add").arg(category_arg())))
                .subcommand(task_fields(
                    Command::new("edit")
                        .arg(category_arg())
                        .arg(Arg::new("id").required(true).value_parser(value_parser!(i64))),
                ))
                .subcommand(
                    Command::new("delete")
                        .arg(category_arg())
                        .arg(Arg::new("id").required(true).value_parser(value_parser!(i64))),
                )
                .subcommand(
                    Command::new("range")
                        .arg(category_arg())
                        .arg(Arg::new("start").required(true).value_parser(parse_date))
                        .arg(Arg::new("end").required(true).value_parser(parse_date)),
                ),
        )
        .subcommand(
            Command::new("profile")
                .subcommand_required(true)
                .subcommand(Command::new("show"))
                .subcommand(
                    Command::new("update")
                        .arg(Arg::new("username").long("username"))
                        .arg(Arg::new("email").long("email")),
                )
                .subcommand(
                    Command::new("password")
                        .arg(Arg::new("new").required(true))
                        .arg(Arg::new("confirm").required(true)),
                ),
        )
}

fn category_arg() -> Arg {
    Arg::new("category")
        .required(true)
        .help("Category id or name")
}

fn task_fields(cmd: Command) -> Command {
    cmd.arg(Arg::new("title").long("title"))
        .arg(Arg::new("description").long("description"))
        .arg(Arg::new("priority").long("priority").value_parser(value_parser!(Priority)))
        .arg(Arg::new("status").long("status").value_parser(value_parser!(TaskStatus)))
        .arg(Arg::new("deadline").long("deadline").help("YYYY-MM-DDTHH:MM"))
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| format!("{}: {}", raw, e))
}

pub async fn dispatch(ctx: &AppContext, matches: &ArgMatches) -> Result<(), ClientError> {
    match matches.subcommand() {
        Some(("signup", m)) => {
            let envelope = ctx
                .auth()
                .signup(text(m, "username"), text(m, "email"), text(m, "password"))
                .await?;
            for error in &envelope.errors {
                println!("  {}", error);
            }
            Ok(())
        }
        Some(("login", m)) => {
            let identity = ctx.auth().login(text(m, "username"), text(m, "password")).await?;
            println!("Signed in as {} (id {})", identity.username, identity.id);
            Ok(())
        }
        Some(("logout", _)) => ctx.auth().logout(),
        Some(("whoami", _)) => {
            match ctx.session.identity() {
                Some(identity) => println!("{} (id {})", identity.username, identity.id),
                None => println!("Not signed in"),
            }
            Ok(())
        }
        Some(("sidebar", m)) => {
            let fixed = m.get_one::<bool>("fixed").copied().unwrap_or(false);
            ctx.session.set_fixed_sidebar(fixed)
        }
        Some(("categories", m)) => categories(ctx, m).await,
        Some(("tasks", m)) => tasks(ctx, m).await,
        Some(("profile", m)) => profile(ctx, m).await,
        _ => Ok(()),
    }
}

async fn categories(ctx: &AppContext, matches: &ArgMatches) -> Result<(), ClientError> {
    let registry = ctx.categories();
    let mut navigation = ctx.navigation();
    registry.load().await?;
    navigation.load().await?;

    match matches.subcommand() {
        Some(("list", _)) => {
            print_categories(&registry.categories());
            return Ok(());
        }
        Some(("add", m)) => {
            let mut form = CategoryForm::with_input(text(m, "name"));
            if registry.create(&mut form).await? == CreateOutcome::Duplicate {
                println!("Not created: {}", form.error.unwrap_or_default());
            }
        }
        Some(("rename", m)) => {
            let id = m.get_one::<i64>("id").copied().unwrap_or_default();
            registry.rename(id, text(m, "name")).await?;
        }
        Some(("delete", m)) => {
            let id = m.get_one::<i64>("id").copied().unwrap_or_default();
            registry.delete(id).await?;
        }
        _ => return Ok(()),
    }

    navigation.pump().await?;
    print_navigation(&navigation);
    Ok(())
}

async fn tasks(ctx: &AppContext, matches: &ArgMatches) -> Result<(), ClientError> {
    let Some((name, m)) = matches.subcommand() else {
        return Ok(());
    };
    let category = resolve_category(ctx, text(m, "category")).await?;
    let view = ctx.tasks(&category);

    match name {
        "list" => {
            view.load().await?;
        }
        "range" => {
            let start = m.get_one::<NaiveDate>("start").copied();
            let end = m.get_one::<NaiveDate>("end").copied();
            if let (Some(start), Some(end)) = (start, end) {
                view.load_by_date_range(start, end).await?;
            }
        }
        "add" | "edit" => {
            view.load().await?;
            let mut editor = match m.try_get_one::<i64>("id").ok().flatten() {
                Some(id) => {
                    let task = view
                        .tasks()
                        .into_iter()
                        .find(|t| t.id == *id)
                        .ok_or_else(|| ClientError::Rejected(format!("No task with id {}", id)))?;
                    TaskEditor::edit(&task)
                }
                None => TaskEditor::new_task(),
            };
            apply_task_fields(&mut editor, m)?;
            let outcome = view.submit(&mut editor).await?;
            println!("{:?}", outcome);
        }
        "delete" => {
            view.load().await?;
            let id = m.get_one::<i64>("id").copied().unwrap_or_default();
            view.delete(id).await?;
        }
        _ => return Ok(()),
    }

    println!("== {} ==", view.category_name());
    print_tasks(&view.rows());
    Ok(())
}

async fn profile(ctx: &AppContext, matches: &ArgMatches) -> Result<(), ClientError> {
    let view = ctx.profile();
    match matches.subcommand() {
        Some(("show", _)) => {
            let profile = view.load().await?;
            println!("Username: {}", profile.username);
            println!("Email:    {}", profile.email);
        }
        Some(("update", m)) => {
            let update = ProfileUpdate {
                username: m.get_one::<String>("username").cloned(),
                email: m.get_one::<String>("email").cloned(),
                password: None,
            };
            let profile = view.update(update).await?;
            println!("Username: {}", profile.username);
            println!("Email:    {}", profile.email);
        }
        Some(("password", m)) => {
            let change = PasswordChange {
                new_password: text(m, "new").to_string(),
                confirm_password: text(m, "confirm").to_string(),
            };
            view.change_password(&change).await?;
        }
        _ => {}
    }
    Ok(())
}

async fn resolve_category(ctx: &AppContext, key: &str) -> Result<Category, ClientError> {
    let registry = ctx.categories();
    registry.load().await?;
    let categories = registry.categories();
    let found = match key.parse::<i64>() {
        Ok(id) => categories.into_iter().find(|c| c.id == id),
        Err(_) => categories
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(key)),
    };
    found.ok_or_else(|| ClientError::Rejected(format!("No category {:?}", key)))
}

fn apply_task_fields(editor: &mut TaskEditor, m: &ArgMatches) -> Result<(), ClientError> {
    let draft = &mut editor.draft;
    if let Some(title) = m.get_one::<String>("title") {
        draft.title = title.clone();
    }
    if let Some(description) = m.get_one::<String>("description") {
        draft.description = Some(description.clone());
    }
    if let Some(priority) = m.get_one::<Priority>("priority") {
        draft.priority = Some(*priority);
    }
    if let Some(status) = m.get_one::<TaskStatus>("status") {
        draft.status = Some(*status);
    }
    if let Some(raw) = m.get_one::<String>("deadline") {
        let deadline = datetime::parse(raw).ok_or_else(|| {
            let mut errors = FieldErrors::new();
            errors.push("deadline", format!("Cannot read {:?} as a date and time", raw));
            ClientError::Validation(errors)
        })?;
        draft.deadline = Some(deadline);
    }
    Ok(())
}

fn text<'a>(m: &'a ArgMatches, name: &str) -> &'a str {
    m.get_one::<String>(name).map(String::as_str).unwrap_or_default()
}

fn print_categories(categories: &[Category]) {
    for category in categories {
        println!("{:>5}  {}", category.id, category.name);
    }
}

fn print_navigation(navigation: &NavigationList) {
    for entry in navigation.entries() {
        println!("{:>5}  {:<24} {}", entry.id, entry.name, entry.route);
    }
}

fn print_tasks(rows: &[TaskRow]) {
    for row in rows {
        let flag = if row.completed {
            "done"
        } else if row.overdue {
            "LATE"
        } else {
            ""
        };
        let countdown = row
            .countdown_days
            .map(|d| format!("{}d", d))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>5}  {:<28} {:<7} {:<12} {:<18} {:>5} {}",
            row.task.id,
            row.task.title,
            row.task.priority,
            row.task.status,
            row.deadline,
            countdown,
            flag
        );
    }
}
