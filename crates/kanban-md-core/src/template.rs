/// Document written when a new board file is created.
pub const NEW_BOARD_TEMPLATE: &str = r"# New Kanban Board

## To Do

### Welcome to Markdown Kanban
  - tags: [getting-started]
  - priority: high
    ```md
    This is your first kanban board! You can:
    - Move tasks between columns
    - Add tags, priorities, and due dates
    - Create steps with checkboxes
    - Archive completed columns
    ```

### Create your first task
  - tags: [todo]
  - priority: medium
  - steps:
      - [ ] Open a task to edit it
      - [ ] Move tasks between columns
      - [ ] Add new columns as needed

## In Progress

## Done

";
