// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Command loop tests against an in-memory server.

mod common;

use common::{connected_shell, pump, run, shell, shell_with, ENDPOINT, RESOLVED_ENDPOINT};
use opcsh_bin::Flow;
use opcsh_config::OutputFormat;
use opcsh_opcua::NodeId;

// =============================================================================
// Disconnected State
// =============================================================================

#[tokio::test]
async fn test_disconnected_prompt_and_help() {
    let (mut shell, _) = shell();

    assert_eq!(shell.prompt(), "> ");
    assert_eq!(
        run(&mut shell, "help").await,
        "Connect {HOST} - Connect to host\nExit - Exit the application\n\n"
    );
}

#[tokio::test]
async fn test_commands_need_a_session() {
    let (mut shell, _) = shell();

    for line in ["ls", "cd Objects", "read", "write", "disconnect", "bogus"] {
        assert_eq!(run(&mut shell, line).await, "Unknown command\n\n", "{}", line);
    }
    assert_eq!(run(&mut shell, "").await, "");
}

#[tokio::test]
async fn test_connect_failure_message() {
    let (mut shell, control) = shell();
    *control.refuse_connect.lock().unwrap() = true;

    let out = run(&mut shell, &format!("connect {}", ENDPOINT)).await;
    assert_eq!(out, "Error while connecting to host\n\n");
    assert!(!shell.is_connected());
    assert_eq!(shell.prompt(), "> ");
}

#[tokio::test]
async fn test_connect_without_address_fails() {
    let (mut shell, _) = shell();
    assert_eq!(
        run(&mut shell, "connect").await,
        "Error while connecting to host\n\n"
    );
}

#[tokio::test]
async fn test_failed_root_browse_closes_session() {
    let (mut shell, control) = shell();
    control.fail_browse.lock().unwrap().insert(NodeId::ROOT_FOLDER);

    let out = run(&mut shell, &format!("connect {}", ENDPOINT)).await;
    assert_eq!(out, "Error while connecting to host\n\n");
    assert!(!shell.gateway().is_connected());
    assert_eq!(control.closed(), 1);
}

// =============================================================================
// Navigation
// =============================================================================

#[tokio::test]
async fn test_prompt_follows_navigation() {
    let (mut shell, _) = connected_shell().await;
    assert_eq!(shell.prompt(), "opc.tcp://plant.local:4840/ua/Root> ");

    assert_eq!(run(&mut shell, "cd Objects").await, "");
    assert_eq!(shell.prompt(), "opc.tcp://plant.local:4840/ua/Root/Objects> ");

    run(&mut shell, "cd Pump").await;
    assert_eq!(shell.prompt(), "opc.tcp://plant.local:4840/ua/Root/Objects/Pump> ");

    assert_eq!(run(&mut shell, "cd ..").await, "");
    assert_eq!(run(&mut shell, "cd ..").await, "");
    assert_eq!(run(&mut shell, "cd ..").await, "");
    assert_eq!(shell.prompt(), "opc.tcp://plant.local:4840/ua/Root> ");
}

#[tokio::test]
async fn test_prompt_shows_resolved_endpoint() {
    let (mut shell, _) = shell();
    run(&mut shell, &format!("connect {}", ENDPOINT)).await;

    assert_ne!(ENDPOINT, RESOLVED_ENDPOINT);
    assert_eq!(shell.prompt(), format!("{}/Root> ", RESOLVED_ENDPOINT));
    assert_eq!(
        shell.gateway().session_info().unwrap().requested_endpoint,
        ENDPOINT
    );
}

#[tokio::test]
async fn test_cd_errors() {
    let (mut shell, _) = connected_shell().await;

    assert_eq!(run(&mut shell, "cd").await, "Missing parameters\n\n");
    assert_eq!(run(&mut shell, "cd objects").await, "Node was not found\n\n");
    assert_eq!(shell.navigator().unwrap().path(), vec!["Root"]);
}

#[tokio::test]
async fn test_cd_into_name_with_spaces() {
    let (mut shell, _) = connected_shell().await;
    run(&mut shell, "cd Objects").await;

    assert_eq!(run(&mut shell, "cd Empty Folder").await, "");
    assert_eq!(shell.navigator().unwrap().path(), vec!["Root", "Objects", "Empty Folder"]);
    assert_eq!(run(&mut shell, "ls").await, "\n");
}

#[tokio::test]
async fn test_failed_browse_keeps_position() {
    let (mut shell, control) = connected_shell().await;
    run(&mut shell, "cd Objects").await;
    control.fail_browse.lock().unwrap().insert(pump());

    let out = run(&mut shell, "cd Pump").await;
    assert!(!out.is_empty());
    assert!(out.ends_with("\n\n"));
    assert_eq!(shell.navigator().unwrap().path(), vec!["Root", "Objects"]);
    assert!(shell.is_connected());
}

// =============================================================================
// Listing and Reading
// =============================================================================

#[tokio::test]
async fn test_ls_lists_children() {
    let (mut shell, _) = connected_shell().await;

    let out = run(&mut shell, "ls").await;
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], format!("{:<12} {:<9} {:<11}", "Objects", "i=85", "Object"));
    assert_eq!(lines[1], format!("{:<12} {:<9} {:<11}", "Views", "i=87", "Object"));
    assert_eq!(lines[2], "");
}

#[tokio::test]
async fn test_read_current_and_named_nodes() {
    let (mut shell, _) = connected_shell().await;
    run(&mut shell, "cd Objects").await;
    run(&mut shell, "cd Pump").await;

    let current = run(&mut shell, "read").await;
    assert!(current.lines().any(|l| l.starts_with("DisplayName") && l.contains("Pump")));
    assert!(current.ends_with("\n\n"));

    let speed = run(&mut shell, "read Speed").await;
    let row = |name: &str| {
        speed
            .lines()
            .find(|l| l.split_whitespace().next() == Some(name))
            .map(str::to_string)
            .unwrap_or_default()
    };
    assert!(row("Value").contains("42.5"));
    assert!(row("DataType").contains("Double"));
    assert!(row("NodeClass").contains("Variable"));

    assert_eq!(run(&mut shell, "read Missing").await, "Node was not found\n\n");
}

#[tokio::test]
async fn test_json_output() {
    let (mut shell, _) = shell_with(OutputFormat::Json);
    run(&mut shell, &format!("connect {}", ENDPOINT)).await;

    let listing: serde_json::Value = serde_json::from_str(&run(&mut shell, "ls").await).unwrap();
    assert_eq!(listing.as_array().unwrap().len(), 2);
    assert_eq!(listing[0]["display_name"], "Objects");

    let node: serde_json::Value = serde_json::from_str(&run(&mut shell, "read").await).unwrap();
    assert_eq!(node["display_name"], "Root");
    assert_eq!(node["node_class"], "Object");
}

#[tokio::test]
async fn test_write_is_not_implemented() {
    let (mut shell, _) = connected_shell().await;
    assert_eq!(run(&mut shell, "write Speed 1").await, "Not implemented\n\n");
}

#[tokio::test]
async fn test_connected_help_and_unknown() {
    let (mut shell, _) = connected_shell().await;

    let help = run(&mut shell, "help").await;
    assert!(help.starts_with("ls              List directory\n"));
    assert!(help.ends_with("\n\n"));

    assert_eq!(run(&mut shell, "connect opc.tcp://other:4840").await, "Unknown command\n\n");
    assert_eq!(run(&mut shell, "Read").await, "Unknown command\n\n");
}

// =============================================================================
// Session Lifecycle
// =============================================================================

#[tokio::test]
async fn test_disconnect_returns_to_offline_state() {
    let (mut shell, control) = connected_shell().await;

    assert_eq!(run(&mut shell, "disconnect").await, "");
    assert_eq!(control.closed(), 1);
    assert!(!shell.is_connected());
    assert_eq!(shell.prompt(), "> ");
    assert_eq!(run(&mut shell, "ls").await, "Unknown command\n\n");

    run(&mut shell, &format!("connect {}", ENDPOINT)).await;
    assert!(shell.is_connected());
}

#[tokio::test]
async fn test_exit_stops_loop() {
    let (mut shell, _) = connected_shell().await;
    assert_eq!(shell.execute("exit").await.unwrap(), Flow::Exit);
    assert_eq!(shell.execute("ls").await.unwrap(), Flow::Continue);
}

#[tokio::test]
async fn test_run_closes_session_on_exit() {
    let (mut shell, control) = shell();
    let input = format!("connect {}\ncd Objects\nexit\nls\n", ENDPOINT);

    shell.run(input.as_bytes()).await.unwrap();

    let out = String::from_utf8(shell.writer().clone()).unwrap();
    assert!(out.starts_with("> opc.tcp://plant.local:4840/ua/Root> "));
    assert!(out.ends_with("opc.tcp://plant.local:4840/ua/Root/Objects> "));
    assert_eq!(control.closed(), 1);
    assert!(!shell.gateway().is_connected());
}

#[tokio::test]
async fn test_run_closes_session_at_end_of_input() {
    let (mut shell, control) = shell();
    let input = format!("connect {}\nls", ENDPOINT);

    shell.run(input.as_bytes()).await.unwrap();

    let out = String::from_utf8(shell.writer().clone()).unwrap();
    assert!(out.contains("Objects"));
    assert_eq!(control.closed(), 1);
}
